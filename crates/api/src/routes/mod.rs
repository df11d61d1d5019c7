pub mod channels;
pub mod comments;
pub mod feed;
pub mod health;
pub mod images;
pub mod posts;
pub mod saved_posts;
pub mod votes;

use axum::{
    middleware::{from_fn, from_fn_with_state},
    Router,
};

use crate::middleware::{auth::resolve_viewer, request_id::request_id};
use crate::state::AppState;

pub fn v1_router(state: AppState) -> Router {
    Router::new()
        .merge(channels::router(state.clone()))
        .merge(feed::router(state.clone()))
        .merge(votes::router(state.clone()))
        .merge(posts::router(state.clone()))
        .merge(comments::router(state.clone()))
        .merge(saved_posts::router(state.clone()))
        .merge(images::router(state))
}

pub fn health_router(state: AppState) -> Router {
    health::router(state)
}

/// The full service: health, then the viewer-aware v1 routes, all tagged with
/// a request id.
pub fn app(state: AppState) -> Router {
    let v1 = v1_router(state.clone()).layer(from_fn_with_state(state.clone(), resolve_viewer));

    Router::new()
        .merge(health_router(state))
        .merge(v1)
        .layer(from_fn(request_id))
}
