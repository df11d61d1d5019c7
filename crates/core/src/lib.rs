//! Community core for Turterra: vote ledger, score aggregation, ranked feeds
//! and the draft/publish lifecycle of forum posts.

pub mod auth;
pub mod config;
pub mod drafts;
pub mod error;
pub mod feed;
pub mod forum;
pub mod media;
#[cfg(any(test, feature = "test-support"))]
pub mod memory;
pub mod scoring;
pub mod store;
pub mod types;
pub mod votes;

pub use error::{Error, Result};
pub use forum::Forum;
pub use store::ForumStore;
