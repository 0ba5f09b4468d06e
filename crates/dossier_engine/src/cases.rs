//! Narrow contract to the case-management store.
//!
//! The engine never owns case data; it looks cases up for matching and
//! attaches confirmed files to a case's document slot. Everything else
//! about cases belongs to the surrounding application.

use async_trait::async_trait;
use dossier_protocol::{CaseRef, DocSlot, SlotAttachment};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaseRepoError {
    #[error("case not found: {0}")]
    NotFound(String),

    #[error("case repository error: {0}")]
    Storage(String),
}

/// Case lookup and slot attachment, as narrow as the engine needs it.
#[async_trait]
pub trait CaseRepository: Send + Sync {
    /// All cases the matcher may guess against.
    async fn list_cases(&self) -> Result<Vec<CaseRef>, CaseRepoError>;

    /// Current attachment in a case's document slot, if any.
    async fn document_in_slot(
        &self,
        case_id: &str,
        slot: DocSlot,
    ) -> Result<Option<SlotAttachment>, CaseRepoError>;

    /// Attach (or replace) the file reference in a case's document slot.
    async fn attach_document(
        &self,
        case_id: &str,
        slot: DocSlot,
        attachment: SlotAttachment,
    ) -> Result<(), CaseRepoError>;

    /// Create a case for a folder that arrived before its case record.
    async fn create_case(&self, display_name: &str) -> Result<CaseRef, CaseRepoError>;
}
