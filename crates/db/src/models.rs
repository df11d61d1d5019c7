use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use turterra_core::types::{
    AuthorSummary, Channel, ChannelSummary, Comment, CommentRow, FeedRow, Post, TargetType,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "vote_target", rename_all = "lowercase")]
pub enum VoteTarget {
    Post,
    Comment,
}

impl From<TargetType> for VoteTarget {
    fn from(value: TargetType) -> Self {
        match value {
            TargetType::Post => VoteTarget::Post,
            TargetType::Comment => VoteTarget::Comment,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ChannelRecord {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub icon_asset: Option<String>,
    pub sort_order: i32,
}

impl From<ChannelRecord> for Channel {
    fn from(row: ChannelRecord) -> Self {
        Channel {
            id: row.id,
            slug: row.slug,
            name: row.name,
            description: row.description,
            icon_asset: row.icon_asset,
            sort_order: row.sort_order,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct PostRecord {
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

impl From<PostRecord> for Post {
    fn from(row: PostRecord) -> Self {
        Post {
            id: row.id,
            title: row.title,
            body: row.body,
            author_id: row.author_id,
            channel_id: row.channel_id,
            image_urls: row.image_urls,
            score: row.score,
            hot_score: row.hot_score,
            comment_count: row.comment_count,
            is_draft: row.is_draft,
            created_at: row.created_at,
            updated_at: row.updated_at,
            published_at: row.published_at,
        }
    }
}

/// A post joined with its author profile and channel.
#[derive(Debug, Clone, FromRow)]
pub struct FeedRecord {
    #[sqlx(flatten)]
    pub post: PostRecord,
    pub author_username: String,
    pub author_display_name: Option<String>,
    pub author_avatar_url: Option<String>,
    pub channel_name: String,
    pub channel_slug: String,
}

impl From<FeedRecord> for FeedRow {
    fn from(row: FeedRecord) -> Self {
        let author = AuthorSummary {
            id: row.post.author_id.clone(),
            username: row.author_username,
            display_name: row.author_display_name,
            avatar_url: row.author_avatar_url,
        };
        let channel = ChannelSummary {
            id: row.post.channel_id.clone(),
            name: row.channel_name,
            slug: row.channel_slug,
        };
        FeedRow {
            post: row.post.into(),
            author,
            channel,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct CommentRecord {
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

impl From<CommentRecord> for Comment {
    fn from(row: CommentRecord) -> Self {
        Comment {
            id: row.id,
            post_id: row.post_id,
            parent_comment_id: row.parent_comment_id,
            author_id: row.author_id,
            body: row.body,
            score: row.score,
            is_deleted: row.is_deleted,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct CommentThreadRecord {
    #[sqlx(flatten)]
    pub comment: CommentRecord,
    pub author_username: String,
    pub author_display_name: Option<String>,
    pub author_avatar_url: Option<String>,
}

impl From<CommentThreadRecord> for CommentRow {
    fn from(row: CommentThreadRecord) -> Self {
        let author = AuthorSummary {
            id: row.comment.author_id.clone(),
            username: row.author_username,
            display_name: row.author_display_name,
            avatar_url: row.author_avatar_url,
        };
        CommentRow {
            comment: row.comment.into(),
            author,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ViewerVoteRecord {
    pub target_id: String,
    pub value: i16,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn post_record() -> PostRecord {
        let at = Utc.with_ymd_and_hms(2025, 2, 1, 9, 30, 0).unwrap();
        PostRecord {
            id: "pst_1".to_string(),
            title: "Red-eared slider basking".to_string(),
            body: None,
            author_id: "usr_1".to_string(),
            channel_id: "chn_1".to_string(),
            image_urls: vec!["https://cdn/x.jpg".to_string()],
            score: 4,
            hot_score: 1.5,
            comment_count: 2,
            is_draft: false,
            created_at: at,
            updated_at: at,
            published_at: Some(at),
        }
    }

    #[test]
    fn test_feed_record_conversion() {
        let row: FeedRow = FeedRecord {
            post: post_record(),
            author_username: "slider".to_string(),
            author_display_name: Some("Slider".to_string()),
            author_avatar_url: None,
            channel_name: "General".to_string(),
            channel_slug: "general".to_string(),
        }
        .into();

        assert_eq!(row.post.id, "pst_1");
        assert_eq!(row.post.image_urls, ["https://cdn/x.jpg"]);
        assert_eq!(row.author.id, "usr_1");
        assert_eq!(row.author.username, "slider");
        assert_eq!(row.channel.id, "chn_1");
        assert_eq!(row.channel.slug, "general");
    }

    #[test]
    fn test_vote_target_from_core() {
        assert_eq!(VoteTarget::from(TargetType::Post), VoteTarget::Post);
        assert_eq!(VoteTarget::from(TargetType::Comment), VoteTarget::Comment);
    }
}
