pub mod access_tokens;
pub mod channels;
pub mod comments;
pub mod posts;
pub mod saved_posts;
pub mod votes;
