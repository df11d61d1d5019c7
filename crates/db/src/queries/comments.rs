use sqlx::PgPool;
use turterra_core::types::Comment;

use crate::models::{CommentRecord, CommentThreadRecord, VoteTarget};
use crate::queries::votes;

pub async fn get_by_id(pool: &PgPool, id: &str) -> Result<Option<CommentRecord>, sqlx::Error> {
    sqlx::query_as::<_, CommentRecord>(
        r#"
        SELECT id, post_id, parent_comment_id, author_id, body, score,
               is_deleted, created_at, updated_at
        FROM comments
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn insert(pool: &PgPool, comment: &Comment) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO comments
            (id, post_id, parent_comment_id, author_id, body, score,
             is_deleted, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(&comment.id)
    .bind(&comment.post_id)
    .bind(&comment.parent_comment_id)
    .bind(&comment.author_id)
    .bind(&comment.body)
    .bind(comment.score)
    .bind(comment.is_deleted)
    .bind(comment.created_at)
    .bind(comment.updated_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn tombstone(pool: &PgPool, id: &str, body: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE comments
        SET body = $1, is_deleted = true, updated_at = now()
        WHERE id = $2
        "#,
    )
    .bind(body)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Whole thread, oldest first. Clients nest by `parent_comment_id`.
pub async fn list_for_post(
    pool: &PgPool,
    post_id: &str,
) -> Result<Vec<CommentThreadRecord>, sqlx::Error> {
    sqlx::query_as::<_, CommentThreadRecord>(
        r#"
        SELECT c.id, c.post_id, c.parent_comment_id, c.author_id, c.body, c.score,
               c.is_deleted, c.created_at, c.updated_at,
               a.username AS author_username,
               a.display_name AS author_display_name,
               a.avatar_url AS author_avatar_url
        FROM comments c
        JOIN profiles a ON a.id = c.author_id
        WHERE c.post_id = $1
        ORDER BY c.created_at ASC, c.id ASC
        "#,
    )
    .bind(post_id)
    .fetch_all(pool)
    .await
}

pub async fn count_live(pool: &PgPool, post_id: &str) -> Result<i32, sqlx::Error> {
    sqlx::query_scalar::<_, i32>(
        r#"
        SELECT COUNT(*)::int
        FROM comments
        WHERE post_id = $1 AND is_deleted = false
        "#,
    )
    .bind(post_id)
    .fetch_one(pool)
    .await
}

/// Comment counterpart of [`crate::queries::posts::recompute_score`].
pub async fn recompute_score(pool: &PgPool, id: &str) -> Result<Option<i32>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let locked = sqlx::query_scalar::<_, String>(
        r#"
        SELECT id
        FROM comments
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?;

    if locked.is_none() {
        return Ok(None);
    }

    let score = votes::sum(&mut *tx, id, VoteTarget::Comment).await?;

    sqlx::query(
        r#"
        UPDATE comments
        SET score = $1
        WHERE id = $2
        "#,
    )
    .bind(score)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(Some(score))
}
