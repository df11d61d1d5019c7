//! Draft → published lifecycle. The transition is one-way.

use crate::error::{Error, Result};
use crate::types::{Post, PostState};

/// Drafts are visible only to their author; published posts to everyone.
pub fn visible_to(post: &Post, viewer_id: Option<&str>) -> bool {
    match post.state() {
        PostState::Published => true,
        PostState::Draft => viewer_id == Some(post.author_id.as_str()),
    }
}

/// Ownership is checked before state, so a stranger learns nothing about
/// whether a post is still a draft.
pub fn ensure_publishable(post: &Post, caller_id: &str) -> Result<()> {
    if post.author_id != caller_id {
        return Err(Error::Forbidden("only the author can publish a draft".to_string()));
    }
    match post.state() {
        PostState::Draft => Ok(()),
        PostState::Published => Err(Error::InvalidState(format!(
            "post {} is already published",
            post.id
        ))),
    }
}
