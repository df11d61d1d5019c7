//! Normalization of image CDN asset records for species and post galleries.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Search results carry context flat; the admin API nests it under `custom`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CdnContext {
    #[serde(default)]
    pub custom: Map<String, Value>,
    #[serde(flatten)]
    pub flat: Map<String, Value>,
}

impl CdnContext {
    fn get(&self, key: &str) -> Option<&Value> {
        self.custom.get(key).or_else(|| self.flat.get(key))
    }
}

/// An asset record as returned by the CDN search API.
#[derive(Debug, Clone, Deserialize)]
pub struct CdnAsset {
    pub public_id: String,
    pub secure_url: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub context: Option<CdnContext>,
}

impl CdnAsset {
    /// Structured metadata first, then free-form context for missing keys.
    fn field(&self, key: &str) -> Option<&Value> {
        self.metadata
            .get(key)
            .or_else(|| self.context.as_ref().and_then(|c| c.get(key)))
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SpeciesImage {
    pub public_id: String,
    pub secure_url: String,
    pub primary_photo: bool,
    pub life_stage: String,
    pub asset_type: String,
    pub credits: String,
    pub author: String,
}

impl From<CdnAsset> for SpeciesImage {
    fn from(asset: CdnAsset) -> Self {
        let primary_photo = flag(asset.field("primary_photo"));
        let life_stage = text(asset.field("life_stage"));
        let asset_type = text(asset.field("asset_type"));
        let credits = text(asset.field("credits"));
        let author = text(asset.field("author"));
        SpeciesImage {
            public_id: asset.public_id,
            secure_url: asset.secure_url,
            primary_photo,
            life_stage,
            asset_type,
            credits,
            author,
        }
    }
}

/// Primary photos sort first; the CDN's order is otherwise kept.
pub fn normalize_assets(assets: Vec<CdnAsset>) -> Vec<SpeciesImage> {
    let mut images: Vec<SpeciesImage> = assets.into_iter().map(SpeciesImage::from).collect();
    images.sort_by_key(|image| !image.primary_photo);
    images
}

fn flag(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}

fn text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}
