use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::models::FeedRecord;

pub async fn insert(
    pool: &PgPool,
    user_id: &str,
    post_id: &str,
    saved_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO saved_posts (user_id, post_id, saved_at)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id, post_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(post_id)
    .bind(saved_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete(pool: &PgPool, user_id: &str, post_id: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        DELETE FROM saved_posts
        WHERE user_id = $1 AND post_id = $2
        "#,
    )
    .bind(user_id)
    .bind(post_id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn saved_among(
    pool: &PgPool,
    user_id: &str,
    post_ids: &[String],
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        r#"
        SELECT post_id
        FROM saved_posts
        WHERE user_id = $1 AND post_id = ANY($2)
        "#,
    )
    .bind(user_id)
    .bind(post_ids)
    .fetch_all(pool)
    .await
}

pub async fn list_for_user(
    pool: &PgPool,
    user_id: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<FeedRecord>, sqlx::Error> {
    let mut qb = QueryBuilder::<Postgres>::new(
        r#"
        SELECT p.id, p.title, p.body, p.author_id, p.channel_id, p.image_urls,
               p.score, p.hot_score, p.comment_count, p.is_draft,
               p.created_at, p.updated_at, p.published_at,
               a.username AS author_username,
               a.display_name AS author_display_name,
               a.avatar_url AS author_avatar_url,
               c.name AS channel_name,
               c.slug AS channel_slug
        FROM saved_posts s
        JOIN posts p ON p.id = s.post_id
        JOIN profiles a ON a.id = p.author_id
        JOIN channels c ON c.id = p.channel_id
        WHERE p.is_draft = false AND s.user_id = "#,
    );
    qb.push_bind(user_id);
    qb.push(" ORDER BY s.saved_at DESC, p.id DESC");
    qb.push(" LIMIT ").push_bind(limit);
    qb.push(" OFFSET ").push_bind(offset);

    qb.build_query_as::<FeedRecord>().fetch_all(pool).await
}
