use thiserror::Error;

/// Failure taxonomy shared by the store layer and the HTTP handlers.
/// Canonical definition lives here in clipstream-types so the db crate and
/// the api crate agree on one set of variants.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed input. Caller error, never retried.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A referenced entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Uniqueness violation that survived the single internal retry.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Missing or invalid actor identity.
    #[error("unauthenticated")]
    Unauthenticated,

    /// The store timed out or is unreachable. Callers may retry with backoff;
    /// this layer never retries it internally.
    #[error("unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Error::NotFound(msg.into())
    }
}
