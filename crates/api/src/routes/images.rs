use axum::{
    extract::{Path, State},
    routing::get,
    Extension, Json, Router,
};
use serde::Serialize;

use turterra_core::media::{normalize_assets, SpeciesImage};

use crate::{
    error::{ApiResult, AppError, ResultExt},
    middleware::auth::Viewer,
    state::{AppState, RequestId},
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/species/{slug}/images", get(species_images))
        .route("/v1/posts/{id}/images", get(post_images))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct ImageListResponse {
    items: Vec<SpeciesImage>,
}

/// Folder names are interpolated into a CDN search expression.
fn is_folder_segment(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

async fn species_images(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(slug): Path<String>,
) -> ApiResult<Json<ImageListResponse>> {
    if !is_folder_segment(&slug) {
        return Err(AppError::BadRequest("invalid species slug".to_string())
            .with_request_id(&request_id.0));
    }
    let assets = state
        .cdn
        .folder_assets(&format!("species/{}", slug))
        .await
        .or_api(&request_id)?;
    Ok(Json(ImageListResponse {
        items: normalize_assets(assets),
    }))
}

async fn post_images(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Extension(request_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> ApiResult<Json<ImageListResponse>> {
    if !is_folder_segment(&id) {
        return Err(AppError::NotFound(format!("post {} not found", id))
            .with_request_id(&request_id.0));
    }
    // Drafts stay hidden from everyone but their author.
    state
        .forum
        .get_post(&id, viewer.id())
        .await
        .or_api(&request_id)?;

    let assets = state
        .cdn
        .folder_assets(&format!("posts/{}", id))
        .await
        .or_api(&request_id)?;
    Ok(Json(ImageListResponse {
        items: normalize_assets(assets),
    }))
}
