use serde::Deserialize;
use std::str::FromStr;

#[derive(Debug, Clone, Deserialize)]
pub struct CloudinarySettings {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database_url: String,
    pub turterra_env: String,
    pub api_bind: String,
    pub db_max_connections: u32,
    pub feed_max_limit: i64,
    /// `None` disables the image endpoints' CDN lookups.
    pub cloudinary: Option<CloudinarySettings>,
}

impl Settings {
    pub fn from_env() -> Result<Self, std::env::VarError> {
        let database_url =
            std::env::var("DATABASE_URL").or_else(|_| std::env::var("TURTERRA_DATABASE_URL"))?;
        let turterra_env = std::env::var("TURTERRA_ENV").unwrap_or_else(|_| "dev".to_string());
        let api_bind =
            std::env::var("TURTERRA_API_BIND").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let db_max_connections = parsed_var("TURTERRA_DB_MAX_CONNECTIONS", 10);
        let feed_max_limit = parsed_var("TURTERRA_FEED_MAX_LIMIT", 100);

        let cloudinary = match (
            std::env::var("CLOUDINARY_CLOUD_NAME"),
            std::env::var("CLOUDINARY_API_KEY"),
            std::env::var("CLOUDINARY_API_SECRET"),
        ) {
            (Ok(cloud_name), Ok(api_key), Ok(api_secret)) => Some(CloudinarySettings {
                cloud_name,
                api_key,
                api_secret,
            }),
            _ => None,
        };

        Ok(Self {
            database_url,
            turterra_env,
            api_bind,
            db_max_connections,
            feed_max_limit,
            cloudinary,
        })
    }
}

fn parsed_var<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
