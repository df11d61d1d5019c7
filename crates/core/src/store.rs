//! Persistence port for the community core.
//!
//! Implementations own no authoritative state between calls. Every method may
//! block on the network and fails with `Error::StoreUnavailable` on transient
//! backend errors.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};

use crate::error::Result;
use crate::types::{
    Channel, Comment, CommentRow, FeedQuery, FeedRow, Post, TargetType, VoteValue,
};

#[async_trait]
pub trait ForumStore: Send + Sync {
    /// Profile id owning an unexpired, unrevoked token digest.
    async fn viewer_for_token(&self, token_hash: &str) -> Result<Option<String>>;

    // Channels
    async fn list_channels(&self) -> Result<Vec<Channel>>;
    async fn get_channel(&self, id: &str) -> Result<Option<Channel>>;
    async fn get_channel_by_slug(&self, slug: &str) -> Result<Option<Channel>>;

    // Posts
    async fn get_post(&self, id: &str) -> Result<Option<Post>>;
    async fn get_feed_row(&self, id: &str) -> Result<Option<FeedRow>>;
    async fn insert_post(&self, post: &Post) -> Result<()>;
    /// Flip a draft to published. Returns `None` when the post is not a draft
    /// any more, which makes concurrent publishes race to a single winner.
    async fn publish_post(
        &self,
        id: &str,
        published_at: DateTime<Utc>,
        hot_score: f64,
    ) -> Result<Option<Post>>;
    /// Published posts only, filtered, ordered and windowed per `query`.
    async fn list_feed(&self, query: &FeedQuery) -> Result<Vec<FeedRow>>;
    async fn list_drafts(&self, author_id: &str) -> Result<Vec<FeedRow>>;
    /// Re-sum the post's votes and write `score` and `hot_score` as one
    /// atomic step, so overlapping recomputes cannot store an older sum.
    /// Fails with `NotFound` when the post is gone.
    async fn recompute_post_score(&self, post_id: &str) -> Result<i32>;
    async fn store_comment_count(&self, post_id: &str, count: i32) -> Result<()>;

    // Comments
    async fn get_comment(&self, id: &str) -> Result<Option<Comment>>;
    async fn insert_comment(&self, comment: &Comment) -> Result<()>;
    async fn tombstone_comment(&self, id: &str, body: &str) -> Result<()>;
    async fn list_comments(&self, post_id: &str) -> Result<Vec<CommentRow>>;
    /// Live (not deleted) comments on a post.
    async fn count_comments(&self, post_id: &str) -> Result<i32>;
    /// Comment counterpart of [`ForumStore::recompute_post_score`].
    async fn recompute_comment_score(&self, comment_id: &str) -> Result<i32>;

    // Votes
    async fn get_vote(
        &self,
        user_id: &str,
        target_id: &str,
        target_type: TargetType,
    ) -> Result<Option<VoteValue>>;
    /// Insert or overwrite through the store's native upsert-on-conflict.
    async fn upsert_vote(
        &self,
        user_id: &str,
        target_id: &str,
        target_type: TargetType,
        value: VoteValue,
    ) -> Result<()>;
    async fn delete_vote(&self, user_id: &str, target_id: &str, target_type: TargetType)
        -> Result<()>;
    /// One round trip for a whole page of targets.
    async fn viewer_votes(
        &self,
        user_id: &str,
        target_type: TargetType,
        target_ids: &[String],
    ) -> Result<HashMap<String, VoteValue>>;

    // Saved posts
    async fn viewer_saved(&self, user_id: &str, post_ids: &[String]) -> Result<HashSet<String>>;
    async fn save_post(&self, user_id: &str, post_id: &str, saved_at: DateTime<Utc>)
        -> Result<()>;
    async fn unsave_post(&self, user_id: &str, post_id: &str) -> Result<()>;
    /// Saved published posts, most recently saved first.
    async fn list_saved(&self, user_id: &str, limit: i64, offset: i64) -> Result<Vec<FeedRow>>;
}
