use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Extension, Json, Router,
};
use serde::Serialize;

use turterra_core::types::{Comment, CommentItem, NewComment};

use crate::{
    error::{ApiResult, ResultExt},
    middleware::auth::Viewer,
    state::{AppState, RequestId},
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/v1/posts/{id}/comments",
            get(list_comments).post(create_comment),
        )
        .route("/v1/comments/{id}", delete(delete_comment))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct CommentListResponse {
    items: Vec<CommentItem>,
}

async fn list_comments(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Extension(request_id): Extension<RequestId>,
    Path(post_id): Path<String>,
) -> ApiResult<Json<CommentListResponse>> {
    let items = state
        .forum
        .list_comments(&post_id, viewer.id())
        .await
        .or_api(&request_id)?;
    Ok(Json(CommentListResponse { items }))
}

async fn create_comment(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Extension(request_id): Extension<RequestId>,
    Path(post_id): Path<String>,
    Json(payload): Json<NewComment>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    let comment = state
        .forum
        .create_comment(viewer.id(), &post_id, payload)
        .await
        .or_api(&request_id)?;
    Ok((StatusCode::CREATED, Json(comment)))
}

async fn delete_comment(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Extension(request_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> ApiResult<Json<Comment>> {
    let comment = state
        .forum
        .delete_comment(viewer.id(), &id)
        .await
        .or_api(&request_id)?;
    Ok(Json(comment))
}
