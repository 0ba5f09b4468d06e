//! Error types for remote storage access.

use thiserror::Error;

/// Remote storage error.
///
/// The poller treats [`RemoteError::Auth`] as systemic (the whole cycle is
/// aborted and retried on the next tick); everything else is local to one
/// page or one file and never aborts a sync.
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("remote authentication rejected: {0}")]
    Auth(String),

    #[error("remote path not found: {0}")]
    NotFound(String),

    #[error("remote rate limit exceeded")]
    RateLimited,

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("remote I/O error: {0}")]
    Io(String),

    #[error("malformed remote response: {0}")]
    Decode(String),
}

impl RemoteError {
    /// Systemic failures abort the current sync cycle; transient ones are
    /// logged and skipped.
    pub fn is_systemic(&self) -> bool {
        matches!(self, RemoteError::Auth(_))
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, RemoteError>;
