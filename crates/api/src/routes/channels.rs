use axum::{extract::State, routing::get, Extension, Json, Router};
use serde::Serialize;

use turterra_core::types::Channel;

use crate::{
    error::{ApiResult, ResultExt},
    state::{AppState, RequestId},
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/channels", get(list_channels))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct ChannelListResponse {
    items: Vec<Channel>,
}

async fn list_channels(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> ApiResult<Json<ChannelListResponse>> {
    let items = state.forum.list_channels().await.or_api(&request_id)?;
    Ok(Json(ChannelListResponse { items }))
}
