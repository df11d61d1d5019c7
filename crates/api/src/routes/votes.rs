use axum::{extract::State, routing::post, Extension, Json, Router};
use serde::Deserialize;

use turterra_core::types::{TargetType, VoteOutcome, VoteValue};

use crate::{
    error::{ApiResult, ResultExt},
    middleware::auth::Viewer,
    state::{AppState, RequestId},
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/votes", post(cast_vote))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VoteRequest {
    target_id: String,
    target_type: TargetType,
    value: i16,
}

async fn cast_vote(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Extension(request_id): Extension<RequestId>,
    Json(payload): Json<VoteRequest>,
) -> ApiResult<Json<VoteOutcome>> {
    let value = VoteValue::try_from(payload.value).or_api(&request_id)?;
    let outcome = state
        .forum
        .apply_vote(viewer.id(), &payload.target_id, payload.target_type, value)
        .await
        .or_api(&request_id)?;
    Ok(Json(outcome))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use std::sync::Arc;

    use crate::cdn::DisabledCdn;
    use crate::routes::testing::{post, send, test_app, AUTHOR_TOKEN, READER_TOKEN};

    #[tokio::test]
    async fn test_vote_flip_and_retract() {
        let app = test_app(Arc::new(DisabledCdn)).await;
        app.store.add_post(post("pst_p", 0, false)).await;

        let vote = |token: &'static str, value: i16| {
            let router = app.router.clone();
            async move {
                send(
                    &router,
                    Method::POST,
                    "/v1/votes",
                    Some(token),
                    Some(json!({ "targetId": "pst_p", "targetType": "post", "value": value })),
                )
                .await
            }
        };

        assert_eq!(vote(READER_TOKEN, 1).await.1["score"], 1);
        assert_eq!(vote(AUTHOR_TOKEN, 1).await.1["score"], 2);
        assert_eq!(vote(READER_TOKEN, -1).await.1["score"], 0);

        let (status, json) = vote(READER_TOKEN, 0).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["score"], 1);
        assert_eq!(json["vote"], 0);
        assert_eq!(json["targetType"], "post");
    }

    #[tokio::test]
    async fn test_anonymous_vote_unauthorized() {
        let app = test_app(Arc::new(DisabledCdn)).await;
        app.store.add_post(post("pst_p", 0, false)).await;

        let (status, json) = send(
            &app.router,
            Method::POST,
            "/v1/votes",
            None,
            Some(json!({ "targetId": "pst_p", "targetType": "post", "value": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"]["code"], "unauthorized");
    }

    #[tokio::test]
    async fn test_out_of_range_vote_rejected() {
        let app = test_app(Arc::new(DisabledCdn)).await;
        app.store.add_post(post("pst_p", 0, false)).await;

        let (status, _) = send(
            &app.router,
            Method::POST,
            "/v1/votes",
            Some(READER_TOKEN),
            Some(json!({ "targetId": "pst_p", "targetType": "post", "value": 2 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
