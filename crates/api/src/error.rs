use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use tracing::error;

use crate::cdn::CdnError;
use crate::state::RequestId;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    pub request_id: String,
}

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Unauthorized,
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    Unavailable,
    Upstream(String),
}

#[derive(Debug)]
pub struct ApiError {
    pub error: AppError,
    pub request_id: String,
}

impl AppError {
    pub fn with_request_id(self, request_id: &str) -> ApiError {
        ApiError {
            error: self,
            request_id: request_id.to_string(),
        }
    }
}

impl From<turterra_core::Error> for AppError {
    fn from(err: turterra_core::Error) -> Self {
        use turterra_core::Error;
        match err {
            Error::Unauthorized => AppError::Unauthorized,
            Error::Forbidden(msg) => AppError::Forbidden(msg),
            err @ Error::NotFound(_) => AppError::NotFound(err.to_string()),
            Error::InvalidState(msg) => AppError::Conflict(msg),
            Error::InvalidInput(msg) => AppError::BadRequest(msg),
            Error::StoreUnavailable(msg) => {
                error!(error = %msg, "store unavailable");
                AppError::Unavailable
            }
        }
    }
}

impl From<CdnError> for AppError {
    fn from(err: CdnError) -> Self {
        error!(error = %err, "image cdn lookup failed");
        AppError::Upstream(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, code, message) = match self.error {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "invalid_request", msg),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Authentication required".to_string(),
            ),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "invalid_state", msg),
            AppError::Unavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "store_unavailable",
                "Storage temporarily unavailable".to_string(),
            ),
            AppError::Upstream(msg) => (StatusCode::BAD_GATEWAY, "upstream_error", msg),
        };

        (
            status,
            Json(ErrorResponse {
                error: ErrorBody {
                    code: code.to_string(),
                    message,
                    request_id: self.request_id,
                },
            }),
        )
            .into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Tag a failed operation with the request id of the call that made it.
pub trait ResultExt<T> {
    fn or_api(self, request_id: &RequestId) -> ApiResult<T>;
}

impl<T, E: Into<AppError>> ResultExt<T> for Result<T, E> {
    fn or_api(self, request_id: &RequestId) -> ApiResult<T> {
        self.map_err(|err| err.into().with_request_id(&request_id.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::response::IntoResponse;

    fn rt() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
    }

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[test]
    fn test_with_request_id() {
        let err = AppError::Unauthorized.with_request_id("req_123");
        assert_eq!(err.request_id, "req_123");
    }

    #[test]
    fn test_bad_request_response() {
        rt().block_on(async {
            let err = AppError::BadRequest("missing field".to_string()).with_request_id("req_001");
            let (status, json) = body_json(err).await;

            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(json["error"]["code"], "invalid_request");
            assert_eq!(json["error"]["message"], "missing field");
            assert_eq!(json["error"]["request_id"], "req_001");
        });
    }

    #[test]
    fn test_unauthorized_response() {
        rt().block_on(async {
            let (status, json) = body_json(AppError::Unauthorized.with_request_id("req_002")).await;

            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(json["error"]["code"], "unauthorized");
            assert_eq!(json["error"]["message"], "Authentication required");
        });
    }

    #[test]
    fn test_core_errors_map_to_status() {
        use turterra_core::Error;

        rt().block_on(async {
            let cases = [
                (Error::Unauthorized, StatusCode::UNAUTHORIZED, "unauthorized"),
                (
                    Error::Forbidden("not the author".to_string()),
                    StatusCode::FORBIDDEN,
                    "forbidden",
                ),
                (
                    Error::not_found("post", "pst_x"),
                    StatusCode::NOT_FOUND,
                    "not_found",
                ),
                (
                    Error::InvalidState("already published".to_string()),
                    StatusCode::CONFLICT,
                    "invalid_state",
                ),
                (
                    Error::InvalidInput("bad sort".to_string()),
                    StatusCode::BAD_REQUEST,
                    "invalid_request",
                ),
                (
                    Error::StoreUnavailable("pool timed out".to_string()),
                    StatusCode::SERVICE_UNAVAILABLE,
                    "store_unavailable",
                ),
            ];

            for (err, expected_status, expected_code) in cases {
                let (status, json) = body_json(AppError::from(err).with_request_id("req_x")).await;
                assert_eq!(status, expected_status);
                assert_eq!(json["error"]["code"], expected_code);
            }
        });
    }

    #[test]
    fn test_not_found_message_names_resource() {
        rt().block_on(async {
            let err = AppError::from(turterra_core::Error::not_found("post", "pst_x"));
            let (_, json) = body_json(err.with_request_id("req_004")).await;
            assert_eq!(json["error"]["message"], "post pst_x not found");
        });
    }

    #[test]
    fn test_store_details_not_leaked() {
        rt().block_on(async {
            let err = AppError::from(turterra_core::Error::StoreUnavailable(
                "connection refused 10.0.0.4:5432".to_string(),
            ));
            let (_, json) = body_json(err.with_request_id("req_005")).await;
            assert_eq!(json["error"]["message"], "Storage temporarily unavailable");
        });
    }

    #[test]
    fn test_upstream_response() {
        rt().block_on(async {
            let err = AppError::from(CdnError::Status(500)).with_request_id("req_006");
            let (status, json) = body_json(err).await;

            assert_eq!(status, StatusCode::BAD_GATEWAY);
            assert_eq!(json["error"]["code"], "upstream_error");
        });
    }

    #[test]
    fn test_or_api_attaches_request_id() {
        let result: Result<(), turterra_core::Error> = Err(turterra_core::Error::Unauthorized);
        let err = result.or_api(&RequestId("req_007".to_string())).unwrap_err();
        assert_eq!(err.request_id, "req_007");
        assert!(matches!(err.error, AppError::Unauthorized));
    }
}
