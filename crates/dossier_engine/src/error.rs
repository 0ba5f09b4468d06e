//! Error types for the engine.

use crate::cases::CaseRepoError;
use dossier_protocol::DocSlot;
use dossier_remote::RemoteError;
use dossier_store::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("remote storage error: {0}")]
    Remote(#[from] RemoteError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("case repository error: {0}")]
    Cases(#[from] CaseRepoError),

    #[error("slot {slot} of case {case_id} already holds a different file (hash {existing_hash})")]
    SlotConflict {
        case_id: String,
        slot: DocSlot,
        existing_hash: String,
    },

    #[error("a sync cycle is already running")]
    SyncInProgress,

    #[error("config error: {0}")]
    Config(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, EngineError>;
