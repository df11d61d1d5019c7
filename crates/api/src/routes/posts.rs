use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Serialize;

use turterra_core::types::{FeedItem, NewPost, Post};

use crate::{
    error::{ApiResult, ResultExt},
    middleware::auth::Viewer,
    state::{AppState, RequestId},
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/posts", post(create_post))
        .route("/v1/posts/{id}", get(get_post))
        .route("/v1/posts/{id}/publish", post(publish_post))
        .route("/v1/me/drafts", get(list_drafts))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct DraftListResponse {
    items: Vec<FeedItem>,
}

async fn create_post(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Extension(request_id): Extension<RequestId>,
    Json(payload): Json<NewPost>,
) -> ApiResult<(StatusCode, Json<Post>)> {
    let post = state
        .forum
        .create_post(viewer.id(), payload)
        .await
        .or_api(&request_id)?;
    Ok((StatusCode::CREATED, Json(post)))
}

async fn get_post(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Extension(request_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> ApiResult<Json<FeedItem>> {
    let item = state
        .forum
        .get_post(&id, viewer.id())
        .await
        .or_api(&request_id)?;
    Ok(Json(item))
}

async fn publish_post(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Extension(request_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> ApiResult<Json<Post>> {
    let post = state
        .forum
        .publish_draft(&id, viewer.id())
        .await
        .or_api(&request_id)?;
    Ok(Json(post))
}

async fn list_drafts(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Extension(request_id): Extension<RequestId>,
) -> ApiResult<Json<DraftListResponse>> {
    let items = state
        .forum
        .list_drafts(viewer.id())
        .await
        .or_api(&request_id)?;
    Ok(Json(DraftListResponse { items }))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use std::sync::Arc;

    use crate::cdn::DisabledCdn;
    use crate::routes::testing::{send, test_app, AUTHOR_TOKEN, GENERAL, READER_TOKEN};

    #[tokio::test]
    async fn test_draft_lifecycle() {
        let app = test_app(Arc::new(DisabledCdn)).await;

        let (status, created) = send(
            &app.router,
            Method::POST,
            "/v1/posts",
            Some(AUTHOR_TOKEN),
            Some(json!({
                "channelId": GENERAL,
                "title": "Hatchling setup",
                "draft": true
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["isDraft"], true);
        let id = created["id"].as_str().unwrap().to_string();
        let uri = format!("/v1/posts/{}", id);
        let publish_uri = format!("/v1/posts/{}/publish", id);

        let (status, _) = send(&app.router, Method::GET, &uri, Some(READER_TOKEN), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, drafts) =
            send(&app.router, Method::GET, "/v1/me/drafts", Some(AUTHOR_TOKEN), None).await;
        assert_eq!(drafts["items"][0]["id"], id.as_str());

        let (status, json) =
            send(&app.router, Method::POST, &publish_uri, Some(READER_TOKEN), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["error"]["code"], "forbidden");

        let (status, published) =
            send(&app.router, Method::POST, &publish_uri, Some(AUTHOR_TOKEN), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(published["isDraft"], false);
        assert!(published["publishedAt"].is_string());

        let (status, json) =
            send(&app.router, Method::POST, &publish_uri, Some(AUTHOR_TOKEN), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["error"]["code"], "invalid_state");

        let (status, json) = send(&app.router, Method::GET, &uri, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["title"], "Hatchling setup");
    }

    #[tokio::test]
    async fn test_create_post_requires_viewer() {
        let app = test_app(Arc::new(DisabledCdn)).await;
        let (status, _) = send(
            &app.router,
            Method::POST,
            "/v1/posts",
            None,
            Some(json!({ "channelId": GENERAL, "title": "Anonymous" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_drafts_require_viewer() {
        let app = test_app(Arc::new(DisabledCdn)).await;
        let (status, _) = send(&app.router, Method::GET, "/v1/me/drafts", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
