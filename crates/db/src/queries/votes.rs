use sqlx::{PgExecutor, PgPool};

use crate::models::{ViewerVoteRecord, VoteTarget};

pub async fn get(
    pool: &PgPool,
    user_id: &str,
    target_id: &str,
    target_type: VoteTarget,
) -> Result<Option<i16>, sqlx::Error> {
    sqlx::query_scalar::<_, i16>(
        r#"
        SELECT value
        FROM votes
        WHERE user_id = $1 AND target_id = $2 AND target_type = $3
        "#,
    )
    .bind(user_id)
    .bind(target_id)
    .bind(target_type)
    .fetch_optional(pool)
    .await
}

/// Single-statement insert or flip; the primary key serializes concurrent
/// votes by the same user on the same target.
pub async fn upsert(
    pool: &PgPool,
    user_id: &str,
    target_id: &str,
    target_type: VoteTarget,
    value: i16,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO votes (user_id, target_id, target_type, value)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (user_id, target_id, target_type)
        DO UPDATE SET value = EXCLUDED.value, updated_at = now()
        "#,
    )
    .bind(user_id)
    .bind(target_id)
    .bind(target_type)
    .bind(value)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete(
    pool: &PgPool,
    user_id: &str,
    target_id: &str,
    target_type: VoteTarget,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        DELETE FROM votes
        WHERE user_id = $1 AND target_id = $2 AND target_type = $3
        "#,
    )
    .bind(user_id)
    .bind(target_id)
    .bind(target_type)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn sum<'e, E>(
    executor: E,
    target_id: &str,
    target_type: VoteTarget,
) -> Result<i32, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_scalar::<_, i32>(
        r#"
        SELECT COALESCE(SUM(value), 0)::int
        FROM votes
        WHERE target_id = $1 AND target_type = $2
        "#,
    )
    .bind(target_id)
    .bind(target_type)
    .fetch_one(executor)
    .await
}

pub async fn for_viewer(
    pool: &PgPool,
    user_id: &str,
    target_type: VoteTarget,
    target_ids: &[String],
) -> Result<Vec<ViewerVoteRecord>, sqlx::Error> {
    sqlx::query_as::<_, ViewerVoteRecord>(
        r#"
        SELECT target_id, value
        FROM votes
        WHERE user_id = $1 AND target_type = $2 AND target_id = ANY($3)
        "#,
    )
    .bind(user_id)
    .bind(target_type)
    .bind(target_ids)
    .fetch_all(pool)
    .await
}
