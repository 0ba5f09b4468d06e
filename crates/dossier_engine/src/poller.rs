//! One poll cycle: cursor-paginated listing, download, fingerprint,
//! dedup, match, upsert.
//!
//! Failures stay local: a bad page ends the walk early with partial
//! progress, a bad download records an `error` row and the cycle moves
//! on. Only an authentication failure aborts the cycle, and even that is
//! retried on the next scheduled tick.

use crate::config::EngineConfig;
use crate::dedup::{collapse_to_latest, Candidate, DedupIndex, DuplicateKind};
use crate::error::Result;
use crate::hasher::{fingerprint, mime_for_name};
use dossier_match::{extract_case_token, guess_case, guess_slots_with, keyword_table};
use dossier_protocol::{suggestion_key, CaseRef, FileEntry, Suggestion, SuggestionStatus};
use dossier_remote::RemoteStore;
use dossier_store::SuggestionStore;
use futures_util::stream::{self, StreamExt};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Outcome of one sync cycle.
#[derive(Debug, Default)]
pub struct SyncReport {
    /// File entries the listing produced.
    pub discovered: usize,
    /// Entries skipped as already tracked or duplicates.
    pub skipped: usize,
    /// Suggestions inserted this cycle.
    pub inserted: u64,
    /// Existing suggestions refreshed this cycle.
    pub updated: u64,
    /// Per-page and per-file failures; none of these aborted the cycle.
    pub errors: Vec<SyncIssue>,
}

/// One non-fatal failure during a cycle.
#[derive(Debug, Clone)]
pub struct SyncIssue {
    pub path: String,
    pub message: String,
}

/// Borrowed view of everything one cycle needs.
pub(crate) struct PollCycle<'a> {
    pub remote: &'a dyn RemoteStore,
    pub store: &'a SuggestionStore,
    pub known_cases: &'a [CaseRef],
    pub config: &'a EngineConfig,
}

impl PollCycle<'_> {
    pub async fn run(&self) -> Result<SyncReport> {
        let mut report = SyncReport::default();

        let entries = self.walk_listing(&mut report).await?;
        report.discovered = entries.len();

        let index = self.store.scan_index().await?;
        let tracked: HashSet<(String, String)> = index
            .iter()
            .filter(|r| r.status != SuggestionStatus::Error)
            .map(|r| (r.remote_path.to_lowercase(), r.revision.clone()))
            .collect();
        let dedup = DedupIndex::from_rows(&index);

        // Download only entries whose (path, revision) is new to us.
        let to_fetch: Vec<FileEntry> = entries
            .into_iter()
            .filter(|e| {
                let key = (e.path.to_lowercase(), e.revision.clone());
                if tracked.contains(&key) {
                    report.skipped += 1;
                    false
                } else {
                    true
                }
            })
            .collect();

        let candidates = self.fetch_candidates(to_fetch, &mut report).await?;

        let before = candidates.len();
        let candidates = collapse_to_latest(candidates);
        report.skipped += before - candidates.len();

        let mut fresh = Vec::new();
        for candidate in candidates {
            match dedup.duplicate_of(&candidate, self.config.near_duplicate_window_ms()) {
                Some(DuplicateKind::SamePathAndHash) => {
                    // Absorb the new revision marker so the next listing
                    // does not re-download unchanged bytes.
                    self.store
                        .refresh_revision(
                            &candidate.entry.path,
                            &candidate.content_hash,
                            &candidate.entry.revision,
                            candidate.entry.modified_at,
                        )
                        .await?;
                    report.skipped += 1;
                }
                Some(DuplicateKind::NearMatch) => {
                    debug!(path = %candidate.entry.path, "near-duplicate dropped");
                    report.skipped += 1;
                }
                None => fresh.push(candidate),
            }
        }

        let suggestions: Vec<Suggestion> =
            fresh.into_iter().map(|c| self.build_suggestion(c)).collect();
        let stats = self.store.upsert(&suggestions).await?;
        report.inserted = stats.inserted;
        report.updated = stats.updated;

        info!(
            discovered = report.discovered,
            inserted = report.inserted,
            updated = report.updated,
            skipped = report.skipped,
            errors = report.errors.len(),
            "sync cycle complete"
        );
        Ok(report)
    }

    /// Walk the cursor-paginated listing. A page failure ends the walk
    /// early, keeping the entries already discovered; an auth failure
    /// aborts the cycle.
    async fn walk_listing(&self, report: &mut SyncReport) -> Result<Vec<FileEntry>> {
        let mut entries = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            match self
                .remote
                .list_folder(&self.config.remote_root, cursor.as_deref())
                .await
            {
                Ok(page) => {
                    entries.extend(page.entries.into_iter().filter(FileEntry::is_file));
                    match page.next_cursor {
                        Some(next) => cursor = Some(next),
                        None => break,
                    }
                }
                Err(e) if e.is_systemic() => return Err(e.into()),
                Err(e) => {
                    warn!(error = %e, "page listing failed, ending cycle early");
                    report.errors.push(SyncIssue {
                        path: self.config.remote_root.clone(),
                        message: e.to_string(),
                    });
                    break;
                }
            }
        }
        Ok(entries)
    }

    /// Download and fingerprint with bounded concurrency. Failures become
    /// `error` rows retried next cycle.
    async fn fetch_candidates(
        &self,
        to_fetch: Vec<FileEntry>,
        report: &mut SyncReport,
    ) -> Result<Vec<Candidate>> {
        let concurrency = self.config.download_concurrency.max(1);
        let remote = self.remote;
        let results: Vec<std::result::Result<Candidate, (FileEntry, String)>> =
            stream::iter(to_fetch.into_iter().map(|entry| async move {
                match remote.download(&entry.path).await {
                    Ok(bytes) => {
                        let content_hash = fingerprint(&bytes);
                        let mime_type = mime_for_name(&entry.name).map(str::to_string);
                        Ok(Candidate {
                            entry,
                            content_hash,
                            mime_type,
                        })
                    }
                    Err(e) => Err((entry, e.to_string())),
                }
            }))
            .buffer_unordered(concurrency)
            .collect()
            .await;

        let mut candidates = Vec::new();
        for result in results {
            match result {
                Ok(candidate) => candidates.push(candidate),
                Err((entry, message)) => {
                    warn!(path = %entry.path, error = %message, "download failed, will retry next cycle");
                    let id = suggestion_key(&entry.path, &entry.revision);
                    self.store.record_error(&id, &entry, &message).await?;
                    report.errors.push(SyncIssue {
                        path: entry.path,
                        message,
                    });
                }
            }
        }
        Ok(candidates)
    }

    fn build_suggestion(&self, candidate: Candidate) -> Suggestion {
        let entry = candidate.entry;
        let guessed_case_id = extract_case_token(&entry.path, &self.config.remote_root)
            .and_then(|token| guess_case(&token, self.known_cases));
        let guessed_slots =
            guess_slots_with(&entry.name, keyword_table(), self.config.min_slot_confidence);

        Suggestion {
            id: suggestion_key(&entry.path, &entry.revision),
            remote_path: entry.path,
            display_name: entry.name,
            size_bytes: entry.size_bytes,
            mime_type: candidate.mime_type,
            content_hash: Some(candidate.content_hash),
            revision: entry.revision,
            revised_at: entry.modified_at,
            guessed_case_id,
            guessed_slots,
            status: SuggestionStatus::Pending,
            notes: None,
            created_at: 0,
            updated_at: 0,
        }
    }
}
