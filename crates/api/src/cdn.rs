//! Image CDN client for species and post galleries.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use turterra_core::config::CloudinarySettings;
use turterra_core::media::CdnAsset;

const CLOUDINARY_API: &str = "https://api.cloudinary.com/v1_1";
const MAX_RESULTS: u32 = 100;

#[derive(Debug, thiserror::Error)]
pub enum CdnError {
    #[error("image cdn is not configured")]
    Disabled,
    #[error("image cdn request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("image cdn returned HTTP {0}")]
    Status(u16),
}

#[async_trait]
pub trait ImageCdn: Send + Sync {
    /// Asset records stored under `folder`, in the CDN's order.
    async fn folder_assets(&self, folder: &str) -> Result<Vec<CdnAsset>, CdnError>;
}

pub struct CloudinaryClient {
    client: reqwest::Client,
    search_url: String,
    api_key: String,
    api_secret: String,
}

impl CloudinaryClient {
    pub fn new(settings: &CloudinarySettings) -> Result<Self, CdnError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            search_url: format!("{}/{}/resources/search", CLOUDINARY_API, settings.cloud_name),
            api_key: settings.api_key.clone(),
            api_secret: settings.api_secret.clone(),
        })
    }
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    expression: String,
    with_field: [&'a str; 2],
    max_results: u32,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    resources: Vec<CdnAsset>,
}

fn folder_expression(folder: &str) -> String {
    format!("folder=\"{}\"", folder)
}

#[async_trait]
impl ImageCdn for CloudinaryClient {
    async fn folder_assets(&self, folder: &str) -> Result<Vec<CdnAsset>, CdnError> {
        let payload = SearchRequest {
            expression: folder_expression(folder),
            with_field: ["metadata", "context"],
            max_results: MAX_RESULTS,
        };

        let resp = self
            .client
            .post(&self.search_url)
            .basic_auth(&self.api_key, Some(&self.api_secret))
            .json(&payload)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(CdnError::Status(resp.status().as_u16()));
        }

        let body: SearchResponse = resp.json().await?;
        debug!(folder, count = body.resources.len(), "cdn folder search");
        Ok(body.resources)
    }
}

/// Used when no CDN credentials are configured.
pub struct DisabledCdn;

#[async_trait]
impl ImageCdn for DisabledCdn {
    async fn folder_assets(&self, _folder: &str) -> Result<Vec<CdnAsset>, CdnError> {
        Err(CdnError::Disabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_request_shape() {
        let payload = SearchRequest {
            expression: folder_expression("species/eastern-box-turtle"),
            with_field: ["metadata", "context"],
            max_results: MAX_RESULTS,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["expression"], "folder=\"species/eastern-box-turtle\"");
        assert_eq!(json["with_field"], serde_json::json!(["metadata", "context"]));
        assert_eq!(json["max_results"], 100);
    }

    #[test]
    fn test_search_url() {
        let client = CloudinaryClient::new(&CloudinarySettings {
            cloud_name: "turterra".to_string(),
            api_key: "key".to_string(),
            api_secret: "secret".to_string(),
        })
        .unwrap();
        assert_eq!(
            client.search_url,
            "https://api.cloudinary.com/v1_1/turterra/resources/search"
        );
    }

    #[test]
    fn test_search_response_tolerates_missing_resources() {
        let body: SearchResponse = serde_json::from_str(r#"{"total_count":0}"#).unwrap();
        assert!(body.resources.is_empty());
    }

    #[tokio::test]
    async fn test_disabled_cdn() {
        let err = DisabledCdn.folder_assets("species/x").await.unwrap_err();
        assert!(matches!(err, CdnError::Disabled));
    }
}
