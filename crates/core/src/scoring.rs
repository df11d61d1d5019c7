//! Net score and time-decayed hot rank.
//!
//! `hot = sign(s) * log10(|s| + 1) + (t - HOT_EPOCH_SECS) / HOT_DECAY_SECS`
//! where `s` is the net vote sum and `t` the publish time in unix seconds.
//! One order of magnitude of net votes is worth `HOT_DECAY_SECS` of
//! freshness (12.5 hours). The `+ 1` keeps the curve strictly increasing
//! through zero, so a post at +1 always outranks an equally old post at 0.

use chrono::{DateTime, Utc};

use crate::types::VoteValue;

/// 2024-01-01T00:00:00Z.
pub const HOT_EPOCH_SECS: i64 = 1_704_067_200;
pub const HOT_DECAY_SECS: f64 = 45_000.0;

pub fn net_score<I>(votes: I) -> i32
where
    I: IntoIterator<Item = VoteValue>,
{
    votes.into_iter().map(|v| i32::from(v.as_i16())).sum()
}

pub fn hot_score(score: i32, ranked_at: DateTime<Utc>) -> f64 {
    let magnitude = (f64::from(score.unsigned_abs()) + 1.0).log10();
    let sign = f64::from(score.signum());
    let seconds = (ranked_at.timestamp() - HOT_EPOCH_SECS) as f64;
    sign * magnitude + seconds / HOT_DECAY_SECS
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_net_score_sums_values() {
        let votes = [VoteValue::Up, VoteValue::Up, VoteValue::Down];
        assert_eq!(net_score(votes), 1);
        assert_eq!(net_score(Vec::new()), 0);
    }

    #[test]
    fn test_hot_score_at_epoch_is_log_of_votes() {
        let epoch = Utc.timestamp_opt(HOT_EPOCH_SECS, 0).unwrap();
        assert_eq!(hot_score(0, epoch), 0.0);
        assert!((hot_score(9, epoch) - 1.0).abs() < 1e-9);
        assert!((hot_score(-9, epoch) + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_newer_post_ranks_at_least_as_high_with_equal_score() {
        for score in [-50, -1, 0, 1, 7, 1200] {
            let older = hot_score(score, t0());
            let newer = hot_score(score, t0() + Duration::minutes(5));
            assert!(newer >= older, "score {} newer {} older {}", score, newer, older);
        }
    }

    #[test]
    fn test_higher_score_ranks_higher_with_equal_age() {
        let scores = [-100, -3, -1, 0, 1, 2, 10, 500];
        for pair in scores.windows(2) {
            let lower = hot_score(pair[0], t0());
            let higher = hot_score(pair[1], t0());
            assert!(higher > lower, "{} should outrank {}", pair[1], pair[0]);
        }
    }

    #[test]
    fn test_decay_trades_votes_for_freshness() {
        // A day-old post needs roughly 10^(86400/45000) ~ 83 more net votes.
        let fresh = hot_score(1, t0() + Duration::days(1));
        let stale_modest = hot_score(50, t0());
        let stale_popular = hot_score(500, t0());
        assert!(fresh > stale_modest);
        assert!(stale_popular > fresh);
    }
}
