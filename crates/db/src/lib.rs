//! Postgres persistence for the Turterra community core.

use sqlx::migrate::{MigrateError, Migrator};
use sqlx::PgPool;

pub mod models;
pub mod queries;
mod store;

pub use store::PgForumStore;

static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await
}
