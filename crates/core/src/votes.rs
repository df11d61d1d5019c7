//! Vote ledger transitions.
//!
//! A vote row is keyed by (user, target, target type) and holds -1 or 1.
//! Planning a vote against the stored value decides the single store write
//! required, if any.

use crate::types::VoteValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteAction {
    /// Requested value already matches what is stored.
    Noop,
    /// Insert, or flip, the row through upsert-on-conflict.
    Upsert(VoteValue),
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VotePlan {
    pub previous: Option<VoteValue>,
    pub next: Option<VoteValue>,
    pub action: VoteAction,
}

impl VotePlan {
    /// Change in the target's net score once the write lands.
    pub fn delta(&self) -> i32 {
        let value = |v: Option<VoteValue>| v.map_or(0, |v| i32::from(v.as_i16()));
        value(self.next) - value(self.previous)
    }

    pub fn is_noop(&self) -> bool {
        self.action == VoteAction::Noop
    }
}

pub fn plan(existing: Option<VoteValue>, requested: VoteValue) -> VotePlan {
    let previous = existing.filter(|v| !v.is_clear());
    let next = Some(requested).filter(|v| !v.is_clear());

    let action = match (previous, next) {
        (None, None) => VoteAction::Noop,
        (Some(_), None) => VoteAction::Delete,
        (Some(stored), Some(wanted)) if stored == wanted => VoteAction::Noop,
        (_, Some(wanted)) => VoteAction::Upsert(wanted),
    };

    VotePlan {
        previous,
        next,
        action,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_vote_inserts() {
        let p = plan(None, VoteValue::Up);
        assert_eq!(p.action, VoteAction::Upsert(VoteValue::Up));
        assert_eq!(p.delta(), 1);
    }

    #[test]
    fn test_same_value_is_noop() {
        let p = plan(Some(VoteValue::Up), VoteValue::Up);
        assert!(p.is_noop());
        assert_eq!(p.delta(), 0);

        let p = plan(Some(VoteValue::Down), VoteValue::Down);
        assert!(p.is_noop());
    }

    #[test]
    fn test_flip_moves_score_by_two() {
        let p = plan(Some(VoteValue::Up), VoteValue::Down);
        assert_eq!(p.action, VoteAction::Upsert(VoteValue::Down));
        assert_eq!(p.delta(), -2);

        let p = plan(Some(VoteValue::Down), VoteValue::Up);
        assert_eq!(p.delta(), 2);
    }

    #[test]
    fn test_clear_deletes_existing_row() {
        let p = plan(Some(VoteValue::Down), VoteValue::Clear);
        assert_eq!(p.action, VoteAction::Delete);
        assert_eq!(p.next, None);
        assert_eq!(p.delta(), 1);
    }

    #[test]
    fn test_clear_without_row_is_noop() {
        let p = plan(None, VoteValue::Clear);
        assert!(p.is_noop());
        assert_eq!(p.delta(), 0);
    }

    #[test]
    fn test_stored_zero_treated_as_absent() {
        let p = plan(Some(VoteValue::Clear), VoteValue::Clear);
        assert!(p.is_noop());
        let p = plan(Some(VoteValue::Clear), VoteValue::Up);
        assert_eq!(p.action, VoteAction::Upsert(VoteValue::Up));
        assert_eq!(p.previous, None);
    }
}
