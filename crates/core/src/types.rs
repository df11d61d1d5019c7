use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::Error;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    Post,
    Comment,
}

impl TargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetType::Post => "post",
            TargetType::Comment => "comment",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    #[default]
    Hot,
    New,
    Top,
}

impl FromStr for SortMode {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "hot" => Ok(SortMode::Hot),
            "new" => Ok(SortMode::New),
            "top" => Ok(SortMode::Top),
            other => Err(Error::InvalidInput(format!("unknown sort mode {:?}", other))),
        }
    }
}

/// A single user's vote on a post or comment.
///
/// `Clear` is the "remove my vote" request; it is never stored. A retracted
/// vote is a deleted row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(into = "i16", try_from = "i16")]
pub enum VoteValue {
    Down,
    Clear,
    Up,
}

impl VoteValue {
    pub fn as_i16(self) -> i16 {
        match self {
            VoteValue::Down => -1,
            VoteValue::Clear => 0,
            VoteValue::Up => 1,
        }
    }

    pub fn is_clear(self) -> bool {
        self == VoteValue::Clear
    }
}

impl TryFrom<i16> for VoteValue {
    type Error = Error;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(VoteValue::Down),
            0 => Ok(VoteValue::Clear),
            1 => Ok(VoteValue::Up),
            other => Err(Error::InvalidInput(format!(
                "vote value must be -1, 0 or 1, got {}",
                other
            ))),
        }
    }
}

impl From<VoteValue> for i16 {
    fn from(value: VoteValue) -> Self {
        value.as_i16()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PostState {
    Draft,
    Published,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub icon_asset: Option<String>,
    pub sort_order: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub title: String,
    pub body: Option<String>,
    pub author_id: String,
    pub channel_id: String,
    pub image_urls: Vec<String>,
    pub score: i32,
    pub hot_score: f64,
    pub comment_count: i32,
    pub is_draft: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

impl Post {
    pub fn state(&self) -> PostState {
        if self.is_draft {
            PostState::Draft
        } else {
            PostState::Published
        }
    }

    /// Timestamp that drives "new" ordering and hot-score decay.
    ///
    /// Drafts fall back to `created_at` until they are published.
    pub fn ranked_at(&self) -> DateTime<Utc> {
        self.published_at.unwrap_or(self.created_at)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    pub parent_comment_id: Option<String>,
    pub author_id: String,
    pub body: String,
    pub score: i32,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SavedPost {
    pub user_id: String,
    pub post_id: String,
    pub saved_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuthorSummary {
    pub id: String,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl From<&Profile> for AuthorSummary {
    fn from(profile: &Profile) -> Self {
        AuthorSummary {
            id: profile.id.clone(),
            username: profile.username.clone(),
            display_name: profile.display_name.clone(),
            avatar_url: profile.avatar_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSummary {
    pub id: String,
    pub name: String,
    pub slug: String,
}

impl From<&Channel> for ChannelSummary {
    fn from(channel: &Channel) -> Self {
        ChannelSummary {
            id: channel.id.clone(),
            name: channel.name.clone(),
            slug: channel.slug.clone(),
        }
    }
}

/// A post joined with its author and channel, as the store returns it.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedRow {
    pub post: Post,
    pub author: AuthorSummary,
    pub channel: ChannelSummary,
}

/// A feed entry decorated with the viewer's own state.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    #[serde(flatten)]
    pub post: Post,
    pub author: AuthorSummary,
    pub channel: ChannelSummary,
    /// `None` when there is no viewer or the viewer has not voted.
    pub viewer_vote: Option<VoteValue>,
    pub saved: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeedPage {
    pub items: Vec<FeedItem>,
    pub limit: i64,
    pub offset: i64,
    pub next_offset: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedQuery {
    pub channel_id: Option<String>,
    pub sort: SortMode,
    pub viewer_id: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for FeedQuery {
    fn default() -> Self {
        FeedQuery {
            channel_id: None,
            sort: SortMode::Hot,
            viewer_id: None,
            limit: crate::feed::DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommentRow {
    pub comment: Comment,
    pub author: AuthorSummary,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CommentItem {
    #[serde(flatten)]
    pub comment: Comment,
    pub author: AuthorSummary,
    pub viewer_vote: Option<VoteValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub channel_id: String,
    pub title: String,
    pub body: Option<String>,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub draft: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub parent_comment_id: Option<String>,
    pub body: String,
}

/// Result of a vote write, used by the UI to reconcile its optimistic toggle.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VoteOutcome {
    pub target_id: String,
    pub target_type: TargetType,
    pub vote: VoteValue,
    pub score: i32,
}
