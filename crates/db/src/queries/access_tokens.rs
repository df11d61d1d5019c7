use sqlx::PgPool;

/// Profile owning a live token digest. Expired and revoked tokens resolve to
/// nothing.
pub async fn profile_for_hash(
    pool: &PgPool,
    token_hash: &str,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        r#"
        SELECT profile_id
        FROM access_tokens
        WHERE token_hash = $1
          AND revoked_at IS NULL
          AND (expires_at IS NULL OR expires_at > now())
        LIMIT 1
        "#,
    )
    .bind(token_hash)
    .fetch_optional(pool)
    .await
}
