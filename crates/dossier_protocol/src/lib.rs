//! Dossier Protocol - shared types for the reconciliation engine
//!
//! One `Suggestion` exists per distinct physical file revision discovered in
//! the remote tree. The poller creates suggestions, a human (or automation)
//! resolves them, and every resolution appends one immutable audit row.
//!
//! # Core Concepts
//!
//! - **Suggestion**: a candidate file with guessed case/slot and a review status
//! - **DocSlot**: a named document category a case holds one attachment for
//! - **AuditEntry**: immutable record of a link/ignore decision
//! - **FileEntry / ListPage**: the narrow remote-storage listing contract

pub mod keys;
pub mod types;

pub use keys::suggestion_key;
pub use types::{
    AuditAction, AuditEntry, CaseRef, DocSlot, EntryKind, FileEntry, ListPage, SlotAttachment,
    SlotMatch, Suggestion, SuggestionStatus,
};
