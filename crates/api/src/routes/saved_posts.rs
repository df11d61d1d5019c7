use axum::{
    extract::{Path, Query, State},
    routing::{delete, get},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};

use turterra_core::feed::DEFAULT_LIMIT;
use turterra_core::types::FeedPage;

use crate::{
    error::{ApiResult, ResultExt},
    middleware::auth::Viewer,
    state::{AppState, RequestId},
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/saved-posts", get(list_saved).post(save_post))
        .route("/v1/saved-posts/{post_id}", delete(unsave_post))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct Pagination {
    limit: Option<i64>,
    offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SaveRequest {
    post_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SaveResponse {
    post_id: String,
    saved: bool,
}

async fn list_saved(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Extension(request_id): Extension<RequestId>,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<FeedPage>> {
    let page = state
        .forum
        .list_saved(
            viewer.id(),
            page.limit.unwrap_or(DEFAULT_LIMIT),
            page.offset.unwrap_or(0),
        )
        .await
        .or_api(&request_id)?;
    Ok(Json(page))
}

async fn save_post(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Extension(request_id): Extension<RequestId>,
    Json(payload): Json<SaveRequest>,
) -> ApiResult<Json<SaveResponse>> {
    let saved = state
        .forum
        .save_post(viewer.id(), &payload.post_id)
        .await
        .or_api(&request_id)?;
    Ok(Json(SaveResponse {
        post_id: payload.post_id,
        saved,
    }))
}

async fn unsave_post(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Extension(request_id): Extension<RequestId>,
    Path(post_id): Path<String>,
) -> ApiResult<Json<SaveResponse>> {
    let saved = state
        .forum
        .unsave_post(viewer.id(), &post_id)
        .await
        .or_api(&request_id)?;
    Ok(Json(SaveResponse { post_id, saved }))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use std::sync::Arc;

    use crate::cdn::DisabledCdn;
    use crate::routes::testing::{post, send, test_app, READER_TOKEN};

    #[tokio::test]
    async fn test_save_list_unsave() {
        let app = test_app(Arc::new(DisabledCdn)).await;
        app.store.add_post(post("pst_p", 0, false)).await;

        for _ in 0..2 {
            let (status, json) = send(
                &app.router,
                Method::POST,
                "/v1/saved-posts",
                Some(READER_TOKEN),
                Some(json!({ "postId": "pst_p" })),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(json["saved"], true);
        }

        let (_, page) =
            send(&app.router, Method::GET, "/v1/saved-posts", Some(READER_TOKEN), None).await;
        assert_eq!(page["items"].as_array().unwrap().len(), 1);
        assert_eq!(page["items"][0]["saved"], true);

        let (status, json) = send(
            &app.router,
            Method::DELETE,
            "/v1/saved-posts/pst_p",
            Some(READER_TOKEN),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["saved"], false);

        let (_, page) =
            send(&app.router, Method::GET, "/v1/saved-posts", Some(READER_TOKEN), None).await;
        assert!(page["items"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_saved_posts_require_viewer() {
        let app = test_app(Arc::new(DisabledCdn)).await;
        let (status, _) = send(&app.router, Method::GET, "/v1/saved-posts", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
