//! In-memory [`ForumStore`] used by tests in this and downstream crates.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::{oneshot, RwLock};

use crate::error::{Error, Result};
use crate::feed;
use crate::scoring;
use crate::store::ForumStore;
use crate::types::{
    AuthorSummary, Channel, ChannelSummary, Comment, CommentRow, FeedQuery, FeedRow, Post,
    Profile, TargetType, VoteValue,
};

type VoteKey = (String, String, TargetType);

#[derive(Default)]
struct State {
    profiles: HashMap<String, Profile>,
    channels: HashMap<String, Channel>,
    posts: HashMap<String, Post>,
    comments: HashMap<String, Comment>,
    votes: HashMap<VoteKey, VoteValue>,
    saved: HashMap<(String, String), DateTime<Utc>>,
    tokens: HashMap<String, String>,
}

impl State {
    fn feed_row(&self, post: &Post) -> Option<FeedRow> {
        let author = self.profiles.get(&post.author_id)?;
        let channel = self.channels.get(&post.channel_id)?;
        Some(FeedRow {
            post: post.clone(),
            author: AuthorSummary::from(author),
            channel: ChannelSummary::from(channel),
        })
    }

    fn vote_sum(&self, target_id: &str, target_type: TargetType) -> i32 {
        let votes = self
            .votes
            .iter()
            .filter(|((_, target, kind), _)| target == target_id && *kind == target_type)
            .map(|(_, value)| *value);
        scoring::net_score(votes)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
    fail_score_writes: AtomicBool,
    viewer_vote_lookups: AtomicUsize,
    recompute_gate: Mutex<Option<oneshot::Receiver<()>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_profile(&self, profile: Profile) {
        let mut state = self.state.write().await;
        state.profiles.insert(profile.id.clone(), profile);
    }

    pub async fn add_channel(&self, channel: Channel) {
        let mut state = self.state.write().await;
        state.channels.insert(channel.id.clone(), channel);
    }

    /// Insert a post as-is, bypassing validation; handy for fixed timestamps.
    pub async fn add_post(&self, post: Post) {
        let mut state = self.state.write().await;
        state.posts.insert(post.id.clone(), post);
    }

    pub async fn add_token(&self, token_hash: &str, profile_id: &str) {
        let mut state = self.state.write().await;
        state
            .tokens
            .insert(token_hash.to_string(), profile_id.to_string());
    }

    pub async fn post(&self, id: &str) -> Option<Post> {
        self.state.read().await.posts.get(id).cloned()
    }

    pub async fn comment(&self, id: &str) -> Option<Comment> {
        self.state.read().await.comments.get(id).cloned()
    }

    pub async fn vote_rows(&self, target_id: &str) -> usize {
        let state = self.state.read().await;
        state
            .votes
            .keys()
            .filter(|(_, target, _)| target == target_id)
            .count()
    }

    /// Make score, hot score and comment count writes fail.
    pub fn set_fail_score_writes(&self, fail: bool) {
        self.fail_score_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of `viewer_votes` calls served so far.
    pub fn viewer_vote_lookups(&self) -> usize {
        self.viewer_vote_lookups.load(Ordering::SeqCst)
    }

    /// Hold the next post score recompute until the returned sender fires
    /// or is dropped.
    pub fn pause_next_recompute(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        if let Ok(mut gate) = self.recompute_gate.lock() {
            *gate = Some(rx);
        }
        tx
    }

    /// True while a pause is armed and no recompute has picked it up yet.
    pub fn recompute_pause_pending(&self) -> bool {
        self.recompute_gate
            .lock()
            .map(|gate| gate.is_some())
            .unwrap_or(false)
    }

    async fn wait_recompute_gate(&self) {
        let gate = self.recompute_gate.lock().ok().and_then(|mut gate| gate.take());
        if let Some(rx) = gate {
            let _ = rx.await;
        }
    }

    fn check_score_writes(&self) -> Result<()> {
        if self.fail_score_writes.load(Ordering::SeqCst) {
            return Err(Error::StoreUnavailable("score write rejected".to_string()));
        }
        Ok(())
    }
}

fn window<T>(items: Vec<T>, limit: i64, offset: i64) -> Vec<T> {
    items
        .into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}

#[async_trait]
impl ForumStore for MemoryStore {
    async fn viewer_for_token(&self, token_hash: &str) -> Result<Option<String>> {
        Ok(self.state.read().await.tokens.get(token_hash).cloned())
    }

    async fn list_channels(&self) -> Result<Vec<Channel>> {
        let state = self.state.read().await;
        let mut channels: Vec<Channel> = state.channels.values().cloned().collect();
        channels.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then_with(|| a.name.cmp(&b.name)));
        Ok(channels)
    }

    async fn get_channel(&self, id: &str) -> Result<Option<Channel>> {
        Ok(self.state.read().await.channels.get(id).cloned())
    }

    async fn get_channel_by_slug(&self, slug: &str) -> Result<Option<Channel>> {
        let state = self.state.read().await;
        Ok(state.channels.values().find(|c| c.slug == slug).cloned())
    }

    async fn get_post(&self, id: &str) -> Result<Option<Post>> {
        Ok(self.state.read().await.posts.get(id).cloned())
    }

    async fn get_feed_row(&self, id: &str) -> Result<Option<FeedRow>> {
        let state = self.state.read().await;
        Ok(state.posts.get(id).and_then(|post| state.feed_row(post)))
    }

    async fn insert_post(&self, post: &Post) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.profiles.contains_key(&post.author_id) {
            return Err(Error::not_found("profile", &post.author_id));
        }
        state.posts.insert(post.id.clone(), post.clone());
        Ok(())
    }

    async fn publish_post(
        &self,
        id: &str,
        published_at: DateTime<Utc>,
        hot_score: f64,
    ) -> Result<Option<Post>> {
        let mut state = self.state.write().await;
        match state.posts.get_mut(id) {
            Some(post) if post.is_draft => {
                post.is_draft = false;
                post.published_at = Some(published_at);
                post.hot_score = hot_score;
                post.updated_at = published_at;
                Ok(Some(post.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn list_feed(&self, query: &FeedQuery) -> Result<Vec<FeedRow>> {
        let state = self.state.read().await;
        let mut posts: Vec<&Post> = state
            .posts
            .values()
            .filter(|p| !p.is_draft)
            .filter(|p| {
                query
                    .channel_id
                    .as_deref()
                    .map_or(true, |channel| p.channel_id == channel)
            })
            .collect();
        posts.sort_by(|a, b| feed::compare(query.sort, a, b));
        let rows = posts.into_iter().filter_map(|p| state.feed_row(p)).collect();
        Ok(window(rows, query.limit, query.offset))
    }

    async fn list_drafts(&self, author_id: &str) -> Result<Vec<FeedRow>> {
        let state = self.state.read().await;
        let mut drafts: Vec<&Post> = state
            .posts
            .values()
            .filter(|p| p.is_draft && p.author_id == author_id)
            .collect();
        drafts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(drafts.into_iter().filter_map(|p| state.feed_row(p)).collect())
    }

    async fn recompute_post_score(&self, post_id: &str) -> Result<i32> {
        self.wait_recompute_gate().await;
        self.check_score_writes()?;
        let mut state = self.state.write().await;
        let score = state.vote_sum(post_id, TargetType::Post);
        let post = state
            .posts
            .get_mut(post_id)
            .ok_or_else(|| Error::not_found("post", post_id))?;
        post.score = score;
        post.hot_score = scoring::hot_score(score, post.ranked_at());
        Ok(score)
    }

    async fn store_comment_count(&self, post_id: &str, count: i32) -> Result<()> {
        self.check_score_writes()?;
        let mut state = self.state.write().await;
        if let Some(post) = state.posts.get_mut(post_id) {
            post.comment_count = count;
        }
        Ok(())
    }

    async fn get_comment(&self, id: &str) -> Result<Option<Comment>> {
        Ok(self.state.read().await.comments.get(id).cloned())
    }

    async fn insert_comment(&self, comment: &Comment) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.posts.contains_key(&comment.post_id) {
            return Err(Error::not_found("post", &comment.post_id));
        }
        state.comments.insert(comment.id.clone(), comment.clone());
        Ok(())
    }

    async fn tombstone_comment(&self, id: &str, body: &str) -> Result<()> {
        let mut state = self.state.write().await;
        if let Some(comment) = state.comments.get_mut(id) {
            comment.body = body.to_string();
            comment.is_deleted = true;
            comment.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn list_comments(&self, post_id: &str) -> Result<Vec<CommentRow>> {
        let state = self.state.read().await;
        let mut comments: Vec<&Comment> = state
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(comments
            .into_iter()
            .filter_map(|c| {
                let author = state.profiles.get(&c.author_id)?;
                Some(CommentRow {
                    comment: c.clone(),
                    author: AuthorSummary::from(author),
                })
            })
            .collect())
    }

    async fn count_comments(&self, post_id: &str) -> Result<i32> {
        let state = self.state.read().await;
        let count = state
            .comments
            .values()
            .filter(|c| c.post_id == post_id && !c.is_deleted)
            .count();
        Ok(count as i32)
    }

    async fn recompute_comment_score(&self, comment_id: &str) -> Result<i32> {
        self.check_score_writes()?;
        let mut state = self.state.write().await;
        let score = state.vote_sum(comment_id, TargetType::Comment);
        let comment = state
            .comments
            .get_mut(comment_id)
            .ok_or_else(|| Error::not_found("comment", comment_id))?;
        comment.score = score;
        Ok(score)
    }

    async fn get_vote(
        &self,
        user_id: &str,
        target_id: &str,
        target_type: TargetType,
    ) -> Result<Option<VoteValue>> {
        let key = (user_id.to_string(), target_id.to_string(), target_type);
        Ok(self.state.read().await.votes.get(&key).copied())
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
        let key = (user_id.to_string(), target_id.to_string(), target_type);
        self.state.write().await.votes.insert(key, value);
        Ok(())
    }

    async fn delete_vote(
        &self,
        user_id: &str,
        target_id: &str,
        target_type: TargetType,
    ) -> Result<()> {
        let key = (user_id.to_string(), target_id.to_string(), target_type);
        self.state.write().await.votes.remove(&key);
        Ok(())
    }

    async fn viewer_votes(
        &self,
        user_id: &str,
        target_type: TargetType,
        target_ids: &[String],
    ) -> Result<HashMap<String, VoteValue>> {
        self.viewer_vote_lookups.fetch_add(1, Ordering::SeqCst);
        let state = self.state.read().await;
        Ok(target_ids
            .iter()
            .filter_map(|id| {
                let key = (user_id.to_string(), id.clone(), target_type);
                state.votes.get(&key).map(|value| (id.clone(), *value))
            })
            .collect())
    }

    async fn viewer_saved(&self, user_id: &str, post_ids: &[String]) -> Result<HashSet<String>> {
        let state = self.state.read().await;
        Ok(post_ids
            .iter()
            .filter(|id| state.saved.contains_key(&(user_id.to_string(), (*id).clone())))
            .cloned()
            .collect())
    }

    async fn save_post(&self, user_id: &str, post_id: &str, saved_at: DateTime<Utc>) -> Result<()> {
        let mut state = self.state.write().await;
        state
            .saved
            .entry((user_id.to_string(), post_id.to_string()))
            .or_insert(saved_at);
        Ok(())
    }

    async fn unsave_post(&self, user_id: &str, post_id: &str) -> Result<()> {
        let mut state = self.state.write().await;
        state
            .saved
            .remove(&(user_id.to_string(), post_id.to_string()));
        Ok(())
    }

    async fn list_saved(&self, user_id: &str, limit: i64, offset: i64) -> Result<Vec<FeedRow>> {
        let state = self.state.read().await;
        let mut saved: Vec<(&DateTime<Utc>, &Post)> = state
            .saved
            .iter()
            .filter(|((user, _), _)| user == user_id)
            .filter_map(|((_, post_id), saved_at)| {
                state
                    .posts
                    .get(post_id)
                    .filter(|p| !p.is_draft)
                    .map(|p| (saved_at, p))
            })
            .collect();
        saved.sort_by(|a, b| b.0.cmp(a.0).then_with(|| b.1.id.cmp(&a.1.id)));
        let rows = saved
            .into_iter()
            .filter_map(|(_, p)| state.feed_row(p))
            .collect();
        Ok(window(rows, limit, offset))
    }
}
