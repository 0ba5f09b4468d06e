//! Dossier Engine - remote-tree reconciliation.
//!
//! Keeps the case store in sync with an external cloud folder tree of
//! scanned documents. One cycle walks the cursor-paginated listing,
//! fingerprints new content, suppresses duplicates, guesses case and
//! document slot per file, and upserts the results as reviewable
//! suggestions. Humans resolve suggestions through `link`/`ignore`;
//! both append to an immutable audit log.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────┐     ┌──────────┐     ┌──────────┐     ┌───────────────┐
//! │  Remote  │     │  Poller  │     │ Matcher  │     │  Suggestion   │
//! │ (list /  │────▶│ (hash +  │────▶│ (case +  │────▶│  Store + Audit│
//! │ download)│     │  dedup)  │     │  slot)   │     │   (SQLite)    │
//! └──────────┘     └──────────┘     └──────────┘     └───────────────┘
//! ```
//!
//! Exactly one engine instance is authoritative for a given remote root;
//! running two against the same root is unsupported.

pub mod cases;
pub mod config;
pub mod dedup;
pub mod engine;
pub mod error;
pub mod hasher;
mod linker;
pub mod poller;

pub use cases::{CaseRepoError, CaseRepository};
pub use config::EngineConfig;
pub use dedup::{collapse_to_latest, Candidate, DedupIndex, DuplicateKind};
pub use engine::Engine;
pub use error::{EngineError, Result};
pub use hasher::{fingerprint, mime_for_name};
pub use poller::{SyncIssue, SyncReport};
