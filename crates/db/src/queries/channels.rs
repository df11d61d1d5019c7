use crate::models::ChannelRecord;
use sqlx::PgPool;

pub async fn list(pool: &PgPool) -> Result<Vec<ChannelRecord>, sqlx::Error> {
    sqlx::query_as::<_, ChannelRecord>(
        r#"
        SELECT id, slug, name, description, icon_asset, sort_order
        FROM channels
        ORDER BY sort_order ASC, name ASC
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn get_by_id(pool: &PgPool, id: &str) -> Result<Option<ChannelRecord>, sqlx::Error> {
    sqlx::query_as::<_, ChannelRecord>(
        r#"
        SELECT id, slug, name, description, icon_asset, sort_order
        FROM channels
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn get_by_slug(pool: &PgPool, slug: &str) -> Result<Option<ChannelRecord>, sqlx::Error> {
    sqlx::query_as::<_, ChannelRecord>(
        r#"
        SELECT id, slug, name, description, icon_asset, sort_order
        FROM channels
        WHERE slug = $1
        "#,
    )
    .bind(slug)
    .fetch_optional(pool)
    .await
}
