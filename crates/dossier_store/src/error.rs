//! Error types for the store layer.

use dossier_protocol::SuggestionStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("suggestion not found: {0}")]
    NotFound(String),

    #[error("suggestion id prefix is ambiguous: {0}")]
    AmbiguousId(String),

    #[error("suggestion {id} is not pending (status: {status})")]
    NotPending { id: String, status: SuggestionStatus },

    #[error("corrupt row: {0}")]
    Decode(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, StoreError>;
