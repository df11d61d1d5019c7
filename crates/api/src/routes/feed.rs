use axum::{
    extract::{Query, State},
    routing::get,
    Extension, Json, Router,
};
use serde::Deserialize;

use turterra_core::feed::DEFAULT_LIMIT;
use turterra_core::types::{FeedPage, FeedQuery, SortMode};

use crate::{
    error::{ApiResult, ResultExt},
    middleware::auth::Viewer,
    state::{AppState, RequestId},
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/feed", get(get_feed))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct FeedParams {
    /// Channel slug; the global feed when absent.
    channel: Option<String>,
    sort: Option<String>,
    limit: Option<i64>,
    offset: Option<i64>,
}

async fn get_feed(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<FeedParams>,
) -> ApiResult<Json<FeedPage>> {
    let sort = match params.sort.as_deref() {
        Some(raw) => raw.parse::<SortMode>().or_api(&request_id)?,
        None => SortMode::default(),
    };

    let channel_id = match params.channel.as_deref() {
        Some(slug) => Some(
            state
                .forum
                .channel_by_slug(slug)
                .await
                .or_api(&request_id)?
                .id,
        ),
        None => None,
    };

    let page = state
        .forum
        .get_feed(FeedQuery {
            channel_id,
            sort,
            viewer_id: viewer.0,
            limit: params.limit.unwrap_or(DEFAULT_LIMIT),
            offset: params.offset.unwrap_or(0),
        })
        .await
        .or_api(&request_id)?;

    Ok(Json(page))
}
