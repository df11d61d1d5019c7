use std::sync::Arc;

use turterra_core::Forum;

use crate::cdn::ImageCdn;

#[derive(Clone)]
pub struct AppState {
    pub forum: Forum,
    pub cdn: Arc<dyn ImageCdn>,
    pub turterra_env: String,
}

#[derive(Debug, Clone)]
pub struct RequestId(pub String);
