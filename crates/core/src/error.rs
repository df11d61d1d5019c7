use thiserror::Error;

/// Failure kinds surfaced by every community operation.
///
/// None of these are fatal to the process; each one is scoped to the request
/// that produced it.
#[derive(Debug, Error)]
pub enum Error {
    /// No viewer, or an unknown bearer token, on an operation that needs one.
    #[error("unauthorized")]
    Unauthorized,

    /// Authenticated, but not allowed to act on the resource.
    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("{0} not found")]
    NotFound(String),

    /// The resource exists but is in the wrong lifecycle state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Transient backend failure (connection, timeout, driver error).
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl Error {
    pub fn not_found(kind: &str, id: &str) -> Self {
        Error::NotFound(format!("{} {}", kind, id))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
