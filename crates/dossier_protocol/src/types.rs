//! Canonical entity and enum definitions shared across all crates.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Canonical Enums (used across all crates)
// ============================================================================

/// Review lifecycle of a suggestion.
/// This is the CANONICAL definition - use this everywhere for suggestion status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionStatus {
    /// Waiting for a reviewer decision
    #[default]
    Pending,
    /// Confirmed and attached to a case slot
    Linked,
    /// Rejected by a reviewer, nothing attached
    Ignored,
    /// Fingerprinting/matching failed; retried on the next poll cycle
    Error,
}

impl SuggestionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionStatus::Pending => "pending",
            SuggestionStatus::Linked => "linked",
            SuggestionStatus::Ignored => "ignored",
            SuggestionStatus::Error => "error",
        }
    }

    /// Terminal statuses can never return to `pending` through the pipeline.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SuggestionStatus::Linked | SuggestionStatus::Ignored)
    }
}

impl fmt::Display for SuggestionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SuggestionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(SuggestionStatus::Pending),
            "linked" => Ok(SuggestionStatus::Linked),
            "ignored" => Ok(SuggestionStatus::Ignored),
            "error" => Ok(SuggestionStatus::Error),
            _ => Err(format!("Invalid suggestion status: '{}'", s)),
        }
    }
}

/// Kind of decision recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuditAction {
    /// File attached to an existing case slot
    Linked,
    /// Reviewer dismissed the suggestion
    Ignored,
    /// File attached to a case created during the link
    NewCase,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Linked => "linked",
            AuditAction::Ignored => "ignored",
            AuditAction::NewCase => "new-case",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "linked" => Ok(AuditAction::Linked),
            "ignored" => Ok(AuditAction::Ignored),
            "new-case" => Ok(AuditAction::NewCase),
            _ => Err(format!("Invalid audit action: '{}'", s)),
        }
    }
}

/// Document slot keys a case can hold one attachment for.
///
/// This enumeration is a compatibility surface shared with the case
/// repository's document-slot schema. Adding a category requires updating
/// both the matcher keyword table and the case schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocSlot {
    #[serde(rename = "doc_birth")]
    Birth,
    #[serde(rename = "doc_marriage")]
    Marriage,
    #[serde(rename = "doc_naturalization")]
    Naturalization,
    #[serde(rename = "doc_passport")]
    Passport,
    #[serde(rename = "doc_death")]
    Death,
    #[serde(rename = "doc_residence")]
    Residence,
    #[serde(rename = "doc_military")]
    Military,
    #[serde(rename = "doc_education")]
    Education,
    #[serde(rename = "doc_employment")]
    Employment,
    #[serde(rename = "doc_criminal")]
    Criminal,
    #[serde(rename = "doc_name_change")]
    NameChange,
    #[serde(rename = "doc_other")]
    Other,
    #[serde(rename = "doc_misc")]
    Misc,
}

impl DocSlot {
    pub const ALL: &'static [DocSlot] = &[
        DocSlot::Birth,
        DocSlot::Marriage,
        DocSlot::Naturalization,
        DocSlot::Passport,
        DocSlot::Death,
        DocSlot::Residence,
        DocSlot::Military,
        DocSlot::Education,
        DocSlot::Employment,
        DocSlot::Criminal,
        DocSlot::NameChange,
        DocSlot::Other,
        DocSlot::Misc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocSlot::Birth => "doc_birth",
            DocSlot::Marriage => "doc_marriage",
            DocSlot::Naturalization => "doc_naturalization",
            DocSlot::Passport => "doc_passport",
            DocSlot::Death => "doc_death",
            DocSlot::Residence => "doc_residence",
            DocSlot::Military => "doc_military",
            DocSlot::Education => "doc_education",
            DocSlot::Employment => "doc_employment",
            DocSlot::Criminal => "doc_criminal",
            DocSlot::NameChange => "doc_name_change",
            DocSlot::Other => "doc_other",
            DocSlot::Misc => "doc_misc",
        }
    }
}

impl fmt::Display for DocSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DocSlot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DocSlot::ALL
            .iter()
            .copied()
            .find(|slot| slot.as_str() == s)
            .ok_or_else(|| format!("Invalid document slot: '{}'", s))
    }
}

// ============================================================================
// Suggestions
// ============================================================================

/// One slot guess produced by the matcher. Never persisted on its own;
/// always part of a suggestion's ranked guess list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlotMatch {
    pub slot: DocSlot,
    /// In (0, 1]; guesses at the fallback floor are low-confidence by definition.
    pub confidence: f64,
}

/// A candidate file discovered remotely, with guessed case/slot and a review
/// status. One per distinct physical file revision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    /// Stable key derived from (remote path, revision marker); repeated
    /// listings upsert rather than duplicate.
    pub id: String,
    pub remote_path: String,
    pub display_name: String,
    pub size_bytes: i64,
    pub mime_type: Option<String>,
    /// Hex digest of file bytes. Absent only on `error` rows where the
    /// download never completed.
    pub content_hash: Option<String>,
    /// Remote revision marker for this observation.
    pub revision: String,
    /// Remote modification timestamp (ms since epoch).
    pub revised_at: i64,
    pub guessed_case_id: Option<String>,
    /// Highest confidence first, at most three entries.
    pub guessed_slots: Vec<SlotMatch>,
    pub status: SuggestionStatus,
    /// Ignore reason or reviewer note; error message on `error` rows.
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

// ============================================================================
// Audit
// ============================================================================

/// Immutable record of one human/automatic decision. Append-only: the sole
/// source of truth for who decided what and when.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: String,
    pub action: AuditAction,
    pub case_id: Option<String>,
    pub slot: Option<DocSlot>,
    pub remote_path: String,
    pub content_hash: Option<String>,
    /// Decision timestamp (ms since epoch).
    pub at: i64,
    /// Actor that made the decision.
    pub by: String,
    pub reason: Option<String>,
}

// ============================================================================
// Remote storage contract
// ============================================================================

/// Entry kind reported by the remote listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Folder,
}

/// One entry from a remote folder listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: String,
    pub name: String,
    pub kind: EntryKind,
    pub size_bytes: i64,
    /// Opaque revision marker; changes whenever the remote content changes.
    pub revision: String,
    /// Remote modification timestamp (ms since epoch).
    pub modified_at: i64,
}

impl FileEntry {
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}

/// One page of a cursor-paginated listing.
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    pub entries: Vec<FileEntry>,
    /// Present while the remote has more pages.
    pub next_cursor: Option<String>,
}

// ============================================================================
// Case repository contract
// ============================================================================

/// Minimal view of a case as the matcher and linker need it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseRef {
    pub id: String,
    /// Short case code staff use in folder names (e.g. `ABC123`).
    pub code: String,
    pub display_name: String,
}

/// File reference attached to a case's document slot on link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotAttachment {
    pub remote_path: String,
    pub content_hash: String,
    pub mime_type: Option<String>,
    pub size_bytes: i64,
    /// Linking timestamp (ms since epoch).
    pub attached_at: i64,
    pub attached_by: String,
}
