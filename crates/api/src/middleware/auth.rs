use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::Response,
    Extension,
};
use tracing::debug;

use turterra_core::auth::parse_bearer;

use crate::{
    error::{ApiError, AppError, ResultExt},
    state::{AppState, RequestId},
};

/// The caller's profile id, or `None` for anonymous requests.
#[derive(Debug, Clone, Default)]
pub struct Viewer(pub Option<String>);

impl Viewer {
    pub fn id(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

/// Resolve an optional bearer token to a [`Viewer`]. A missing header is an
/// anonymous viewer; a malformed or unknown token is rejected.
pub async fn resolve_viewer(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let viewer = match req.headers().get(header::AUTHORIZATION) {
        None => Viewer(None),
        Some(value) => {
            let token = value
                .to_str()
                .ok()
                .and_then(parse_bearer)
                .ok_or_else(|| AppError::Unauthorized.with_request_id(&request_id.0))?;

            let profile_id = state
                .forum
                .viewer_for_token(token)
                .await
                .or_api(&request_id)?
                .ok_or_else(|| AppError::Unauthorized.with_request_id(&request_id.0))?;

            debug!(profile_id = %profile_id, "viewer resolved");
            Viewer(Some(profile_id))
        }
    };

    req.extensions_mut().insert(viewer);
    Ok(next.run(req).await)
}
