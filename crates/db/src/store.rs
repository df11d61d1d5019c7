use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::{HashMap, HashSet};
use tracing::warn;

use turterra_core::types::{
    Channel, Comment, CommentRow, FeedQuery, FeedRow, Post, TargetType, VoteValue,
};
use turterra_core::{Error, ForumStore, Result};

use crate::models::VoteTarget;
use crate::queries;

const FOREIGN_KEY_VIOLATION: &str = "23503";
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Clone)]
pub struct PgForumStore {
    pool: PgPool,
}

impl PgForumStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn store_error(err: sqlx::Error) -> Error {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.code().as_deref() {
            Some(FOREIGN_KEY_VIOLATION) => {
                return Error::NotFound(format!(
                    "row referenced by {}",
                    db_err.constraint().unwrap_or("unknown")
                ))
            }
            Some(UNIQUE_VIOLATION) => {
                return Error::InvalidState(format!(
                    "duplicate row for {}",
                    db_err.constraint().unwrap_or("unknown")
                ))
            }
            _ => {}
        }
    }
    warn!(error = %err, "store query failed");
    Error::StoreUnavailable(err.to_string())
}

fn vote_value(raw: i16) -> Result<VoteValue> {
    VoteValue::try_from(raw)
        .map_err(|_| Error::StoreUnavailable(format!("stored vote value {} out of range", raw)))
}

#[async_trait]
impl ForumStore for PgForumStore {
    async fn viewer_for_token(&self, token_hash: &str) -> Result<Option<String>> {
        queries::access_tokens::profile_for_hash(&self.pool, token_hash)
            .await
            .map_err(store_error)
    }

    async fn list_channels(&self) -> Result<Vec<Channel>> {
        let rows = queries::channels::list(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(rows.into_iter().map(Channel::from).collect())
    }

    async fn get_channel(&self, id: &str) -> Result<Option<Channel>> {
        let row = queries::channels::get_by_id(&self.pool, id)
            .await
            .map_err(store_error)?;
        Ok(row.map(Channel::from))
    }

    async fn get_channel_by_slug(&self, slug: &str) -> Result<Option<Channel>> {
        let row = queries::channels::get_by_slug(&self.pool, slug)
            .await
            .map_err(store_error)?;
        Ok(row.map(Channel::from))
    }

    async fn get_post(&self, id: &str) -> Result<Option<Post>> {
        let row = queries::posts::get_by_id(&self.pool, id)
            .await
            .map_err(store_error)?;
        Ok(row.map(Post::from))
    }

    async fn get_feed_row(&self, id: &str) -> Result<Option<FeedRow>> {
        let row = queries::posts::get_feed_row(&self.pool, id)
            .await
            .map_err(store_error)?;
        Ok(row.map(FeedRow::from))
    }

    async fn insert_post(&self, post: &Post) -> Result<()> {
        queries::posts::insert(&self.pool, post)
            .await
            .map_err(store_error)
    }

    async fn publish_post(
        &self,
        id: &str,
        published_at: DateTime<Utc>,
        hot_score: f64,
    ) -> Result<Option<Post>> {
        let row = queries::posts::publish(&self.pool, id, published_at, hot_score)
            .await
            .map_err(store_error)?;
        Ok(row.map(Post::from))
    }

    async fn list_feed(&self, query: &FeedQuery) -> Result<Vec<FeedRow>> {
        let rows = queries::posts::list_feed(
            &self.pool,
            query.channel_id.as_deref(),
            query.sort,
            query.limit,
            query.offset,
        )
        .await
        .map_err(store_error)?;
        Ok(rows.into_iter().map(FeedRow::from).collect())
    }

    async fn list_drafts(&self, author_id: &str) -> Result<Vec<FeedRow>> {
        let rows = queries::posts::list_drafts(&self.pool, author_id)
            .await
            .map_err(store_error)?;
        Ok(rows.into_iter().map(FeedRow::from).collect())
    }

    async fn recompute_post_score(&self, post_id: &str) -> Result<i32> {
        queries::posts::recompute_score(&self.pool, post_id)
            .await
            .map_err(store_error)?
            .ok_or_else(|| Error::not_found("post", post_id))
    }

    async fn store_comment_count(&self, post_id: &str, count: i32) -> Result<()> {
        queries::posts::update_comment_count(&self.pool, post_id, count)
            .await
            .map_err(store_error)
    }

    async fn get_comment(&self, id: &str) -> Result<Option<Comment>> {
        let row = queries::comments::get_by_id(&self.pool, id)
            .await
            .map_err(store_error)?;
        Ok(row.map(Comment::from))
    }

    async fn insert_comment(&self, comment: &Comment) -> Result<()> {
        queries::comments::insert(&self.pool, comment)
            .await
            .map_err(store_error)
    }

    async fn tombstone_comment(&self, id: &str, body: &str) -> Result<()> {
        queries::comments::tombstone(&self.pool, id, body)
            .await
            .map_err(store_error)
    }

    async fn list_comments(&self, post_id: &str) -> Result<Vec<CommentRow>> {
        let rows = queries::comments::list_for_post(&self.pool, post_id)
            .await
            .map_err(store_error)?;
        Ok(rows.into_iter().map(CommentRow::from).collect())
    }

    async fn count_comments(&self, post_id: &str) -> Result<i32> {
        queries::comments::count_live(&self.pool, post_id)
            .await
            .map_err(store_error)
    }

    async fn recompute_comment_score(&self, comment_id: &str) -> Result<i32> {
        queries::comments::recompute_score(&self.pool, comment_id)
            .await
            .map_err(store_error)?
            .ok_or_else(|| Error::not_found("comment", comment_id))
    }

    async fn get_vote(
        &self,
        user_id: &str,
        target_id: &str,
        target_type: TargetType,
    ) -> Result<Option<VoteValue>> {
        let raw = queries::votes::get(&self.pool, user_id, target_id, target_type.into())
            .await
            .map_err(store_error)?;
        raw.map(vote_value).transpose()
    }

    async fn upsert_vote(
        &self,
        user_id: &str,
        target_id: &str,
        target_type: TargetType,
        value: VoteValue,
    ) -> Result<()> {
        if value.is_clear() {
            return Err(Error::InvalidInput("cannot store a cleared vote".to_string()));
        }
        queries::votes::upsert(
            &self.pool,
            user_id,
            target_id,
            target_type.into(),
            value.as_i16(),
        )
        .await
        .map_err(store_error)
    }

    async fn delete_vote(
        &self,
        user_id: &str,
        target_id: &str,
        target_type: TargetType,
    ) -> Result<()> {
        queries::votes::delete(&self.pool, user_id, target_id, target_type.into())
            .await
            .map_err(store_error)
    }

    async fn viewer_votes(
        &self,
        user_id: &str,
        target_type: TargetType,
        target_ids: &[String],
    ) -> Result<HashMap<String, VoteValue>> {
        if target_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let target: VoteTarget = target_type.into();
        let rows = queries::votes::for_viewer(&self.pool, user_id, target, target_ids)
            .await
            .map_err(store_error)?;
        rows.into_iter()
            .map(|row| Ok((row.target_id, vote_value(row.value)?)))
            .collect()
    }

    async fn viewer_saved(&self, user_id: &str, post_ids: &[String]) -> Result<HashSet<String>> {
        if post_ids.is_empty() {
            return Ok(HashSet::new());
        }
        let ids = queries::saved_posts::saved_among(&self.pool, user_id, post_ids)
            .await
            .map_err(store_error)?;
        Ok(ids.into_iter().collect())
    }

    async fn save_post(
        &self,
        user_id: &str,
        post_id: &str,
        saved_at: DateTime<Utc>,
    ) -> Result<()> {
        queries::saved_posts::insert(&self.pool, user_id, post_id, saved_at)
            .await
            .map_err(store_error)
    }

    async fn unsave_post(&self, user_id: &str, post_id: &str) -> Result<()> {
        queries::saved_posts::delete(&self.pool, user_id, post_id)
            .await
            .map_err(store_error)
    }

    async fn list_saved(&self, user_id: &str, limit: i64, offset: i64) -> Result<Vec<FeedRow>> {
        let rows = queries::saved_posts::list_for_user(&self.pool, user_id, limit, offset)
            .await
            .map_err(store_error)?;
        Ok(rows.into_iter().map(FeedRow::from).collect())
    }
}
