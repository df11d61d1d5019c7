use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

use turterra_core::config::Settings;
use turterra_core::Forum;
use turterra_db::PgForumStore;

mod cdn;
mod error;
mod middleware;
mod routes;
mod state;

use crate::cdn::{CloudinaryClient, DisabledCdn, ImageCdn};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .json()
        .init();

    let settings = Settings::from_env()
        .map_err(|err| anyhow::anyhow!("DATABASE_URL or TURTERRA_DATABASE_URL: {}", err))?;

    let db = PgPoolOptions::new()
        .max_connections(settings.db_max_connections)
        .connect(&settings.database_url)
        .await?;

    turterra_db::run_migrations(&db).await?;

    let cdn: Arc<dyn ImageCdn> = match &settings.cloudinary {
        Some(cloudinary) => Arc::new(CloudinaryClient::new(cloudinary)?),
        None => {
            warn!("cloudinary credentials missing, image endpoints disabled");
            Arc::new(DisabledCdn)
        }
    };

    let state = AppState {
        forum: Forum::new(Arc::new(PgForumStore::new(db)), settings.feed_max_limit),
        cdn,
        turterra_env: settings.turterra_env.clone(),
    };

    let app = routes::app(state);

    let addr: SocketAddr = settings.api_bind.parse()?;

    info!(%addr, env = %settings.turterra_env, "starting api");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
