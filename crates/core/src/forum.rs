//! Community operations over a [`ForumStore`].
//!
//! Denormalized counters (`score`, `hot_score`, `comment_count`) are only ever
//! written by [`Forum::refresh_score`] and [`Forum::refresh_comment_count`],
//! which recompute them from live rows. Both are best-effort: a failure is
//! logged and the triggering write still succeeds.

use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::auth::hash_token;
use crate::drafts;
use crate::error::{Error, Result};
use crate::feed;
use crate::scoring;
use crate::store::ForumStore;
use crate::types::{
    Channel, Comment, CommentItem, FeedItem, FeedPage, FeedQuery, FeedRow, NewComment, NewPost,
    Post, TargetType, VoteOutcome, VoteValue,
};
use crate::votes::{self, VoteAction};

pub const MAX_TITLE_CHARS: usize = 300;
pub const MAX_COMMENT_CHARS: usize = 10_000;
pub const DELETED_BODY: &str = "[deleted]";

#[derive(Clone)]
pub struct Forum {
    store: Arc<dyn ForumStore>,
    max_feed_limit: i64,
}

impl Forum {
    pub fn new(store: Arc<dyn ForumStore>, max_feed_limit: i64) -> Self {
        Self {
            store,
            max_feed_limit: max_feed_limit.max(1),
        }
    }

    pub async fn viewer_for_token(&self, raw_token: &str) -> Result<Option<String>> {
        self.store.viewer_for_token(&hash_token(raw_token)).await
    }

    pub async fn list_channels(&self) -> Result<Vec<Channel>> {
        self.store.list_channels().await
    }

    pub async fn channel_by_slug(&self, slug: &str) -> Result<Channel> {
        self.store
            .get_channel_by_slug(slug)
            .await?
            .ok_or_else(|| Error::not_found("channel", slug))
    }

    // ------------------------------------------------------------------
    // Vote ledger
    // ------------------------------------------------------------------

    pub async fn apply_vote(
        &self,
        viewer: Option<&str>,
        target_id: &str,
        target_type: TargetType,
        value: VoteValue,
    ) -> Result<VoteOutcome> {
        let user_id = viewer.ok_or(Error::Unauthorized)?;
        let stored_score = self.vote_target_score(user_id, target_id, target_type).await?;

        let existing = self.store.get_vote(user_id, target_id, target_type).await?;
        let plan = votes::plan(existing, value);

        match plan.action {
            VoteAction::Noop => {
                debug!(user_id, target_id, target = target_type.as_str(), "vote unchanged")
            }
            VoteAction::Upsert(v) => {
                self.store
                    .upsert_vote(user_id, target_id, target_type, v)
                    .await?
            }
            VoteAction::Delete => self.store.delete_vote(user_id, target_id, target_type).await?,
        }

        // A repeated vote still re-sums, which heals a score left stale by an
        // earlier failed recompute.
        let score = self
            .refresh_score_or_stale(target_id, target_type, stored_score)
            .await;

        if plan.action != VoteAction::Noop {
            info!(
                user_id,
                target_id,
                target = target_type.as_str(),
                delta = plan.delta(),
                score,
                "vote applied"
            );
        }

        Ok(VoteOutcome {
            target_id: target_id.to_string(),
            target_type,
            vote: plan.next.unwrap_or(VoteValue::Clear),
            score,
        })
    }

    /// Current denormalized score of a vote target the user may vote on.
    async fn vote_target_score(
        &self,
        user_id: &str,
        target_id: &str,
        target_type: TargetType,
    ) -> Result<i32> {
        match target_type {
            TargetType::Post => {
                let post = self
                    .store
                    .get_post(target_id)
                    .await?
                    .filter(|post| drafts::visible_to(post, Some(user_id)))
                    .ok_or_else(|| Error::not_found("post", target_id))?;
                Ok(post.score)
            }
            TargetType::Comment => {
                let comment = self
                    .store
                    .get_comment(target_id)
                    .await?
                    .ok_or_else(|| Error::not_found("comment", target_id))?;
                if comment.is_deleted {
                    return Err(Error::InvalidState(format!(
                        "comment {} is deleted",
                        target_id
                    )));
                }
                Ok(comment.score)
            }
        }
    }

    /// Re-sum live votes into the target's denormalized score. Posts also get
    /// their hot score recomputed; comment votes never touch the parent post.
    pub async fn refresh_score(&self, target_id: &str, target_type: TargetType) -> Result<i32> {
        match target_type {
            TargetType::Post => self.store.recompute_post_score(target_id).await,
            TargetType::Comment => self.store.recompute_comment_score(target_id).await,
        }
    }

    async fn refresh_score_or_stale(
        &self,
        target_id: &str,
        target_type: TargetType,
        stale: i32,
    ) -> i32 {
        match self.refresh_score(target_id, target_type).await {
            Ok(score) => score,
            Err(err) => {
                warn!(
                    target_id,
                    target = target_type.as_str(),
                    error = %err,
                    "score recompute failed, serving stale score"
                );
                stale
            }
        }
    }

    pub async fn refresh_comment_count(&self, post_id: &str) -> Result<i32> {
        let count = self.store.count_comments(post_id).await?;
        self.store.store_comment_count(post_id, count).await?;
        Ok(count)
    }

    async fn refresh_comment_count_or_log(&self, post_id: &str) {
        if let Err(err) = self.refresh_comment_count(post_id).await {
            warn!(post_id, error = %err, "comment count recompute failed");
        }
    }

    // ------------------------------------------------------------------
    // Feed assembler
    // ------------------------------------------------------------------

    pub async fn get_feed(&self, query: FeedQuery) -> Result<FeedPage> {
        let (limit, offset) =
            feed::normalize_window(query.limit, query.offset, self.max_feed_limit)?;
        let query = FeedQuery {
            limit,
            offset,
            ..query
        };

        let mut rows = self.store.list_feed(&query).await?;
        rows.retain(|row| !row.post.is_draft);

        let items = self.decorate(rows, query.viewer_id.as_deref()).await?;
        Ok(FeedPage::new(items, limit, offset))
    }

    /// Attach the viewer's votes and saved flags with one batch lookup each.
    async fn decorate(&self, rows: Vec<FeedRow>, viewer: Option<&str>) -> Result<Vec<FeedItem>> {
        let (votes, saved) = match viewer {
            Some(user_id) if !rows.is_empty() => {
                let ids = feed::post_ids(&rows);
                let votes = self
                    .store
                    .viewer_votes(user_id, TargetType::Post, &ids)
                    .await?;
                let saved = self.store.viewer_saved(user_id, &ids).await?;
                (votes, saved)
            }
            _ => (HashMap::new(), HashSet::new()),
        };
        Ok(feed::decorate(rows, &votes, &saved))
    }

    // ------------------------------------------------------------------
    // Posts and drafts
    // ------------------------------------------------------------------

    pub async fn get_post(&self, post_id: &str, viewer: Option<&str>) -> Result<FeedItem> {
        let row = self
            .store
            .get_feed_row(post_id)
            .await?
            .filter(|row| drafts::visible_to(&row.post, viewer))
            .ok_or_else(|| Error::not_found("post", post_id))?;
        let mut items = self.decorate(vec![row], viewer).await?;
        items.pop().ok_or_else(|| Error::not_found("post", post_id))
    }

    pub async fn create_post(&self, caller: Option<&str>, new_post: NewPost) -> Result<Post> {
        let author_id = caller.ok_or(Error::Unauthorized)?;

        let title = new_post.title.trim();
        if title.is_empty() || title.chars().count() > MAX_TITLE_CHARS {
            return Err(Error::InvalidInput(format!(
                "title must be 1 to {} characters",
                MAX_TITLE_CHARS
            )));
        }

        let channel = self
            .store
            .get_channel(&new_post.channel_id)
            .await?
            .ok_or_else(|| Error::not_found("channel", &new_post.channel_id))?;

        let now = Utc::now();
        let post = Post {
            id: format!("pst_{}", nanoid::nanoid!(12)),
            title: title.to_string(),
            body: new_post.body.filter(|body| !body.trim().is_empty()),
            author_id: author_id.to_string(),
            channel_id: channel.id,
            image_urls: new_post
                .image_urls
                .into_iter()
                .map(|url| url.trim().to_string())
                .filter(|url| !url.is_empty())
                .collect(),
            score: 0,
            hot_score: scoring::hot_score(0, now),
            comment_count: 0,
            is_draft: new_post.draft,
            created_at: now,
            updated_at: now,
            published_at: (!new_post.draft).then_some(now),
        };

        self.store.insert_post(&post).await?;
        info!(post_id = %post.id, author_id, draft = post.is_draft, "post created");
        Ok(post)
    }

    /// One-way draft → published transition. "New" ordering and hot decay use
    /// `published_at`; `created_at` keeps the draft creation time.
    pub async fn publish_draft(&self, post_id: &str, caller: Option<&str>) -> Result<Post> {
        let caller_id = caller.ok_or(Error::Unauthorized)?;
        let post = self
            .store
            .get_post(post_id)
            .await?
            .ok_or_else(|| Error::not_found("post", post_id))?;

        drafts::ensure_publishable(&post, caller_id)?;

        let now = Utc::now();
        let hot = scoring::hot_score(post.score, now);
        let mut published = self
            .store
            .publish_post(post_id, now, hot)
            .await?
            .ok_or_else(|| Error::InvalidState(format!("post {} is already published", post_id)))?;

        // Votes cast while the publish was in flight are folded in here.
        published.score = self
            .refresh_score_or_stale(post_id, TargetType::Post, published.score)
            .await;
        published.hot_score = scoring::hot_score(published.score, now);

        info!(post_id, author_id = caller_id, "draft published");
        Ok(published)
    }

    pub async fn list_drafts(&self, caller: Option<&str>) -> Result<Vec<FeedItem>> {
        let author_id = caller.ok_or(Error::Unauthorized)?;
        let rows = self.store.list_drafts(author_id).await?;
        self.decorate(rows, Some(author_id)).await
    }

    // ------------------------------------------------------------------
    // Comments
    // ------------------------------------------------------------------

    pub async fn create_comment(
        &self,
        caller: Option<&str>,
        post_id: &str,
        new_comment: NewComment,
    ) -> Result<Comment> {
        let author_id = caller.ok_or(Error::Unauthorized)?;

        let post = self
            .store
            .get_post(post_id)
            .await?
            .filter(|post| drafts::visible_to(post, Some(author_id)))
            .ok_or_else(|| Error::not_found("post", post_id))?;
        if post.is_draft {
            return Err(Error::InvalidState("cannot comment on a draft".to_string()));
        }

        let body = new_comment.body.trim();
        if body.is_empty() || body.chars().count() > MAX_COMMENT_CHARS {
            return Err(Error::InvalidInput(format!(
                "comment must be 1 to {} characters",
                MAX_COMMENT_CHARS
            )));
        }

        if let Some(parent_id) = new_comment.parent_comment_id.as_deref() {
            let parent = self
                .store
                .get_comment(parent_id)
                .await?
                .ok_or_else(|| Error::not_found("comment", parent_id))?;
            if parent.post_id != post.id {
                return Err(Error::InvalidInput(
                    "parent comment belongs to another post".to_string(),
                ));
            }
        }

        let now = Utc::now();
        let comment = Comment {
            id: format!("cmt_{}", nanoid::nanoid!(12)),
            post_id: post.id.clone(),
            parent_comment_id: new_comment.parent_comment_id,
            author_id: author_id.to_string(),
            body: body.to_string(),
            score: 0,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };

        self.store.insert_comment(&comment).await?;
        self.refresh_comment_count_or_log(&post.id).await;

        info!(comment_id = %comment.id, post_id = %post.id, author_id, "comment created");
        Ok(comment)
    }

    /// Soft delete: the body is tombstoned, the row stays to hold its replies.
    pub async fn delete_comment(&self, caller: Option<&str>, comment_id: &str) -> Result<Comment> {
        let caller_id = caller.ok_or(Error::Unauthorized)?;
        let mut comment = self
            .store
            .get_comment(comment_id)
            .await?
            .ok_or_else(|| Error::not_found("comment", comment_id))?;

        if comment.author_id != caller_id {
            return Err(Error::Forbidden("only the author can delete a comment".to_string()));
        }
        if comment.is_deleted {
            return Ok(comment);
        }

        self.store.tombstone_comment(comment_id, DELETED_BODY).await?;
        self.refresh_comment_count_or_log(&comment.post_id).await;

        comment.body = DELETED_BODY.to_string();
        comment.is_deleted = true;
        comment.updated_at = Utc::now();
        info!(comment_id, post_id = %comment.post_id, "comment deleted");
        Ok(comment)
    }

    pub async fn list_comments(
        &self,
        post_id: &str,
        viewer: Option<&str>,
    ) -> Result<Vec<CommentItem>> {
        self.store
            .get_post(post_id)
            .await?
            .filter(|post| drafts::visible_to(post, viewer))
            .ok_or_else(|| Error::not_found("post", post_id))?;

        let rows = self.store.list_comments(post_id).await?;
        let votes = match viewer {
            Some(user_id) if !rows.is_empty() => {
                let ids: Vec<String> = rows.iter().map(|row| row.comment.id.clone()).collect();
                self.store
                    .viewer_votes(user_id, TargetType::Comment, &ids)
                    .await?
            }
            _ => HashMap::new(),
        };

        Ok(rows
            .into_iter()
            .map(|mut row| {
                if row.comment.is_deleted {
                    row.comment.body = DELETED_BODY.to_string();
                }
                let viewer_vote = votes.get(&row.comment.id).copied();
                CommentItem {
                    comment: row.comment,
                    author: row.author,
                    viewer_vote,
                }
            })
            .collect())
    }

    // ------------------------------------------------------------------
    // Saved posts
    // ------------------------------------------------------------------

    pub async fn save_post(&self, caller: Option<&str>, post_id: &str) -> Result<bool> {
        let user_id = caller.ok_or(Error::Unauthorized)?;
        self.store
            .get_post(post_id)
            .await?
            .filter(|post| drafts::visible_to(post, Some(user_id)))
            .ok_or_else(|| Error::not_found("post", post_id))?;

        self.store.save_post(user_id, post_id, Utc::now()).await?;
        debug!(user_id, post_id, "post saved");
        Ok(true)
    }

    pub async fn unsave_post(&self, caller: Option<&str>, post_id: &str) -> Result<bool> {
        let user_id = caller.ok_or(Error::Unauthorized)?;
        self.store.unsave_post(user_id, post_id).await?;
        debug!(user_id, post_id, "post unsaved");
        Ok(false)
    }

    pub async fn list_saved(
        &self,
        caller: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<FeedPage> {
        let user_id = caller.ok_or(Error::Unauthorized)?;
        let (limit, offset) = feed::normalize_window(limit, offset, self.max_feed_limit)?;
        let mut rows = self.store.list_saved(user_id, limit, offset).await?;
        rows.retain(|row| !row.post.is_draft);
        let items = self.decorate(rows, Some(user_id)).await?;
        Ok(FeedPage::new(items, limit, offset))
    }
}
