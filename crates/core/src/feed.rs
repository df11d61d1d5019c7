use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::error::{Error, Result};
use crate::types::{FeedItem, FeedPage, FeedRow, Post, SortMode, VoteValue};

pub const DEFAULT_LIMIT: i64 = 20;

/// Validate an offset window, clamping the limit to `1..=max_limit`.
pub fn normalize_window(limit: i64, offset: i64, max_limit: i64) -> Result<(i64, i64)> {
    if offset < 0 {
        return Err(Error::InvalidInput("offset must not be negative".to_string()));
    }
    let limit = if limit <= 0 {
        DEFAULT_LIMIT.min(max_limit)
    } else {
        limit.min(max_limit)
    };
    Ok((limit.max(1), offset))
}

/// Feed ordering: the sort key descending, then publish time descending, then
/// id descending so that pages are deterministic.
pub fn compare(sort: SortMode, a: &Post, b: &Post) -> Ordering {
    let primary = match sort {
        SortMode::Hot => b.hot_score.total_cmp(&a.hot_score),
        SortMode::New => b.ranked_at().cmp(&a.ranked_at()),
        SortMode::Top => b.score.cmp(&a.score),
    };
    primary
        .then_with(|| b.ranked_at().cmp(&a.ranked_at()))
        .then_with(|| b.id.cmp(&a.id))
}

pub fn post_ids(rows: &[FeedRow]) -> Vec<String> {
    rows.iter().map(|row| row.post.id.clone()).collect()
}

pub fn decorate(
    rows: Vec<FeedRow>,
    votes: &HashMap<String, VoteValue>,
    saved: &HashSet<String>,
) -> Vec<FeedItem> {
    rows.into_iter()
        .map(|row| {
            let viewer_vote = votes.get(&row.post.id).copied();
            let saved = saved.contains(&row.post.id);
            FeedItem {
                post: row.post,
                author: row.author,
                channel: row.channel,
                viewer_vote,
                saved,
            }
        })
        .collect()
}

impl FeedPage {
    pub fn new(items: Vec<FeedItem>, limit: i64, offset: i64) -> Self {
        let len = items.len() as i64;
        let next_offset = (len >= limit).then_some(offset + len);
        FeedPage {
            items,
            limit,
            offset,
            next_offset,
        }
    }
}
