use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use turterra_core::scoring;
use turterra_core::types::{Post, SortMode};

use crate::models::{FeedRecord, PostRecord, VoteTarget};
use crate::queries::votes;

const FEED_SELECT: &str = r#"
    SELECT p.id, p.title, p.body, p.author_id, p.channel_id, p.image_urls,
           p.score, p.hot_score, p.comment_count, p.is_draft,
           p.created_at, p.updated_at, p.published_at,
           a.username AS author_username,
           a.display_name AS author_display_name,
           a.avatar_url AS author_avatar_url,
           c.name AS channel_name,
           c.slug AS channel_slug
    FROM posts p
    JOIN profiles a ON a.id = p.author_id
    JOIN channels c ON c.id = p.channel_id
"#;

/// Sort key first, then publish time, then id, all descending. Feeds only
/// hold published rows, whose `published_at` is never null, so these match
/// the partial feed indexes column for column.
fn order_clause(sort: SortMode) -> &'static str {
    match sort {
        SortMode::Hot => " ORDER BY p.hot_score DESC, p.published_at DESC, p.id DESC",
        SortMode::New => " ORDER BY p.published_at DESC, p.id DESC",
        SortMode::Top => " ORDER BY p.score DESC, p.published_at DESC, p.id DESC",
    }
}

pub async fn get_by_id(pool: &PgPool, id: &str) -> Result<Option<PostRecord>, sqlx::Error> {
    sqlx::query_as::<_, PostRecord>(
        r#"
        SELECT id, title, body, author_id, channel_id, image_urls,
               score, hot_score, comment_count, is_draft,
               created_at, updated_at, published_at
        FROM posts
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn get_feed_row(pool: &PgPool, id: &str) -> Result<Option<FeedRecord>, sqlx::Error> {
    let mut qb = QueryBuilder::<Postgres>::new(FEED_SELECT);
    qb.push(" WHERE p.id = ").push_bind(id);
    qb.build_query_as::<FeedRecord>().fetch_optional(pool).await
}

pub async fn insert(pool: &PgPool, post: &Post) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO posts
            (id, title, body, author_id, channel_id, image_urls,
             score, hot_score, comment_count, is_draft,
             created_at, updated_at, published_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        "#,
    )
    .bind(&post.id)
    .bind(&post.title)
    .bind(&post.body)
    .bind(&post.author_id)
    .bind(&post.channel_id)
    .bind(&post.image_urls)
    .bind(post.score)
    .bind(post.hot_score)
    .bind(post.comment_count)
    .bind(post.is_draft)
    .bind(post.created_at)
    .bind(post.updated_at)
    .bind(post.published_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Conditional on `is_draft`, so only one of several concurrent publishes
/// gets a row back.
pub async fn publish(
    pool: &PgPool,
    id: &str,
    published_at: DateTime<Utc>,
    hot_score: f64,
) -> Result<Option<PostRecord>, sqlx::Error> {
    sqlx::query_as::<_, PostRecord>(
        r#"
        UPDATE posts
        SET is_draft = false,
            published_at = $2,
            hot_score = $3,
            updated_at = $2
        WHERE id = $1 AND is_draft = true
        RETURNING id, title, body, author_id, channel_id, image_urls,
                  score, hot_score, comment_count, is_draft,
                  created_at, updated_at, published_at
        "#,
    )
    .bind(id)
    .bind(published_at)
    .bind(hot_score)
    .fetch_optional(pool)
    .await
}

pub async fn list_feed(
    pool: &PgPool,
    channel_id: Option<&str>,
    sort: SortMode,
    limit: i64,
    offset: i64,
) -> Result<Vec<FeedRecord>, sqlx::Error> {
    let mut qb = QueryBuilder::<Postgres>::new(FEED_SELECT);
    qb.push(" WHERE p.is_draft = false");
    if let Some(channel_id) = channel_id {
        qb.push(" AND p.channel_id = ").push_bind(channel_id);
    }
    qb.push(order_clause(sort));
    qb.push(" LIMIT ").push_bind(limit);
    qb.push(" OFFSET ").push_bind(offset);

    qb.build_query_as::<FeedRecord>().fetch_all(pool).await
}

pub async fn list_drafts(pool: &PgPool, author_id: &str) -> Result<Vec<FeedRecord>, sqlx::Error> {
    let mut qb = QueryBuilder::<Postgres>::new(FEED_SELECT);
    qb.push(" WHERE p.is_draft = true AND p.author_id = ")
        .push_bind(author_id);
    qb.push(" ORDER BY p.created_at DESC, p.id DESC");

    qb.build_query_as::<FeedRecord>().fetch_all(pool).await
}

/// Re-sum the post's votes and store `score`/`hot_score` in one transaction.
/// The post row stays locked from the read to the write, so concurrent
/// recomputes of the same post run one after another and the last one sees
/// every committed vote. Returns `None` when the post does not exist.
pub async fn recompute_score(pool: &PgPool, id: &str) -> Result<Option<i32>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let ranked_at = sqlx::query_scalar::<_, DateTime<Utc>>(
        r#"
        SELECT COALESCE(published_at, created_at)
        FROM posts
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(ranked_at) = ranked_at else {
        return Ok(None);
    };

    let score = votes::sum(&mut *tx, id, VoteTarget::Post).await?;

    sqlx::query(
        r#"
        UPDATE posts
        SET score = $1, hot_score = $2
        WHERE id = $3
        "#,
    )
    .bind(score)
    .bind(scoring::hot_score(score, ranked_at))
    .bind(id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(Some(score))
}

pub async fn update_comment_count(pool: &PgPool, id: &str, count: i32) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE posts
        SET comment_count = $1
        WHERE id = $2
        "#,
    )
    .bind(count)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_clause_tie_breaks() {
        for sort in [SortMode::Hot, SortMode::New, SortMode::Top] {
            let clause = order_clause(sort);
            assert!(clause.starts_with(" ORDER BY "));
            assert!(clause.ends_with("p.published_at DESC, p.id DESC"));
            assert!(!clause.contains("COALESCE"));
        }
        assert!(order_clause(SortMode::Hot).contains("p.hot_score DESC"));
        assert!(order_clause(SortMode::Top).contains("p.score DESC"));
    }
}
