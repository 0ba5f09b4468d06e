//! Commit reviewer decisions: link, ignore, link-as-new-case.
//!
//! Every successful decision appends exactly one audit row. The store's
//! `WHERE status = 'pending'` guard is the linearization point, so a
//! second decision on the same suggestion is rejected before any audit
//! row is written.

use crate::cases::CaseRepository;
use crate::error::{EngineError, Result};
use chrono::Utc;
use dossier_protocol::{AuditAction, CaseRef, DocSlot, SlotAttachment, Suggestion, SuggestionStatus};
use dossier_store::{AuditLog, StoreError, SuggestionStore};
use tracing::info;

pub(crate) struct Linker<'a> {
    pub store: &'a SuggestionStore,
    pub audit: &'a AuditLog,
    pub cases: &'a dyn CaseRepository,
}

impl Linker<'_> {
    /// Attach a pending suggestion to `(case_id, slot)`.
    ///
    /// A different file already occupying the slot is a conflict the
    /// caller must resolve explicitly via `overwrite`; the engine never
    /// replaces silently.
    pub async fn link(
        &self,
        suggestion_id: &str,
        case_id: &str,
        slot: DocSlot,
        actor: &str,
        overwrite: bool,
    ) -> Result<()> {
        let suggestion = self.pending_suggestion(suggestion_id).await?;
        let content_hash = required_hash(&suggestion)?;

        if let Some(existing) = self.cases.document_in_slot(case_id, slot).await? {
            if existing.content_hash != content_hash && !overwrite {
                return Err(EngineError::SlotConflict {
                    case_id: case_id.to_string(),
                    slot,
                    existing_hash: existing.content_hash,
                });
            }
        }

        self.cases
            .attach_document(case_id, slot, attachment(&suggestion, &content_hash, actor))
            .await?;
        self.store
            .mark_linked(suggestion_id, case_id, slot, actor)
            .await?;
        self.audit
            .append(
                AuditAction::Linked,
                Some(case_id),
                Some(slot),
                &suggestion.remote_path,
                Some(&content_hash),
                actor,
                None,
            )
            .await?;

        info!(suggestion_id, case_id, slot = %slot, actor, "suggestion linked to case");
        Ok(())
    }

    /// Dismiss a pending suggestion. Touches no case data.
    pub async fn ignore(&self, suggestion_id: &str, reason: &str, actor: &str) -> Result<()> {
        let suggestion = self.pending_suggestion(suggestion_id).await?;

        self.store.mark_ignored(suggestion_id, reason, actor).await?;
        self.audit
            .append(
                AuditAction::Ignored,
                None,
                None,
                &suggestion.remote_path,
                suggestion.content_hash.as_deref(),
                actor,
                Some(reason),
            )
            .await?;

        info!(suggestion_id, actor, "suggestion ignored");
        Ok(())
    }

    /// Create a case for a folder that arrived before its case record,
    /// then link the suggestion into it.
    pub async fn link_as_new_case(
        &self,
        suggestion_id: &str,
        case_name: &str,
        slot: DocSlot,
        actor: &str,
    ) -> Result<CaseRef> {
        let suggestion = self.pending_suggestion(suggestion_id).await?;
        let content_hash = required_hash(&suggestion)?;

        let case = self.cases.create_case(case_name).await?;
        self.cases
            .attach_document(&case.id, slot, attachment(&suggestion, &content_hash, actor))
            .await?;
        self.store
            .mark_linked(suggestion_id, &case.id, slot, actor)
            .await?;
        self.audit
            .append(
                AuditAction::NewCase,
                Some(&case.id),
                Some(slot),
                &suggestion.remote_path,
                Some(&content_hash),
                actor,
                None,
            )
            .await?;

        info!(suggestion_id, case_id = %case.id, actor, "suggestion linked to new case");
        Ok(case)
    }

    /// Fetch and fast-reject anything not pending. The store transition
    /// guard re-checks atomically later; this just gives callers a clean
    /// error without touching case data.
    async fn pending_suggestion(&self, suggestion_id: &str) -> Result<Suggestion> {
        let suggestion = self
            .store
            .get(suggestion_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(suggestion_id.to_string()))?;
        if suggestion.status != SuggestionStatus::Pending {
            return Err(StoreError::NotPending {
                id: suggestion_id.to_string(),
                status: suggestion.status,
            }
            .into());
        }
        Ok(suggestion)
    }
}

fn attachment(suggestion: &Suggestion, content_hash: &str, actor: &str) -> SlotAttachment {
    SlotAttachment {
        remote_path: suggestion.remote_path.clone(),
        content_hash: content_hash.to_string(),
        mime_type: suggestion.mime_type.clone(),
        size_bytes: suggestion.size_bytes,
        attached_at: Utc::now().timestamp_millis(),
        attached_by: actor.to_string(),
    }
}

fn required_hash(suggestion: &Suggestion) -> Result<String> {
    suggestion
        .content_hash
        .clone()
        .ok_or_else(|| StoreError::Decode(format!("pending suggestion {} has no content hash", suggestion.id)).into())
}
