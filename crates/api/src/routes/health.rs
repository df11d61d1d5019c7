use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    env: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        env: state.turterra_env,
    })
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use std::sync::Arc;

    use crate::cdn::DisabledCdn;
    use crate::routes::testing::{send, test_app};

    #[tokio::test]
    async fn test_health() {
        let app = test_app(Arc::new(DisabledCdn)).await;
        let (status, json) = send(&app.router, Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert_eq!(json["env"], "test");
    }
}
