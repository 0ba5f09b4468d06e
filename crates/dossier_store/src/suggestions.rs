//! Keyed repository over suggestions with atomic status transitions.

use crate::error::{Result, StoreError};
use chrono::Utc;
use dossier_protocol::{DocSlot, FileEntry, SlotMatch, Suggestion, SuggestionStatus};
use sqlx::{Pool, Sqlite};
use tracing::{debug, info};

const SUGGESTION_COLUMNS: &str = "id, remote_path, display_name, size_bytes, mime_type, \
     content_hash, revision, revised_at, guessed_case_id, guessed_slots, status, notes, \
     created_at, updated_at";

pub struct SuggestionStore {
    pool: Pool<Sqlite>,
}

/// Outcome of one batch upsert.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UpsertStats {
    pub inserted: u64,
    pub updated: u64,
}

/// Lightweight per-row view the poller and deduplicator index one poll
/// cycle against. One query per cycle instead of one per entry.
#[derive(Debug, Clone)]
pub struct ScanIndexRow {
    pub remote_path: String,
    pub revision: String,
    pub status: SuggestionStatus,
    pub display_name: String,
    pub size_bytes: i64,
    pub content_hash: Option<String>,
    pub revised_at: i64,
}

/// Queue counts by status.
#[derive(Debug, sqlx::FromRow)]
pub struct StoreStats {
    pub pending: i32,
    pub linked: i32,
    pub ignored: i32,
    pub error: i32,
}

impl SuggestionStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Idempotent batch merge keyed by id.
    ///
    /// Unseen ids are inserted as `pending`. Existing rows get their matcher
    /// fields refreshed in place; an `error` row observed successfully again
    /// returns to `pending`; `linked` and `ignored` never regress.
    pub async fn upsert(&self, batch: &[Suggestion]) -> Result<UpsertStats> {
        let mut stats = UpsertStats::default();
        let now = now_ms();
        let mut tx = self.pool.begin().await?;

        for suggestion in batch {
            let slots_json = encode_slots(&suggestion.guessed_slots)?;
            let existing: Option<String> =
                sqlx::query_scalar("SELECT status FROM dossier_suggestions WHERE id = ?")
                    .bind(&suggestion.id)
                    .fetch_optional(&mut *tx)
                    .await?;

            match existing {
                None => {
                    sqlx::query(
                        r#"
                        INSERT INTO dossier_suggestions
                            (id, remote_path, display_name, size_bytes, mime_type, content_hash,
                             revision, revised_at, guessed_case_id, guessed_slots, status, notes,
                             created_at, updated_at)
                        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 'pending', NULL, ?, ?)
                        "#,
                    )
                    .bind(&suggestion.id)
                    .bind(&suggestion.remote_path)
                    .bind(&suggestion.display_name)
                    .bind(suggestion.size_bytes)
                    .bind(&suggestion.mime_type)
                    .bind(&suggestion.content_hash)
                    .bind(&suggestion.revision)
                    .bind(suggestion.revised_at)
                    .bind(&suggestion.guessed_case_id)
                    .bind(&slots_json)
                    .bind(now)
                    .bind(now)
                    .execute(&mut *tx)
                    .await?;
                    stats.inserted += 1;
                }
                Some(_) => {
                    // Refresh rescan fields; resurrect error rows, never
                    // regress a terminal status.
                    sqlx::query(
                        r#"
                        UPDATE dossier_suggestions
                        SET display_name = ?,
                            size_bytes = ?,
                            mime_type = ?,
                            content_hash = ?,
                            revised_at = ?,
                            guessed_case_id = ?,
                            guessed_slots = ?,
                            status = CASE WHEN status = 'error' THEN 'pending' ELSE status END,
                            notes = CASE WHEN status = 'error' THEN NULL ELSE notes END,
                            updated_at = ?
                        WHERE id = ?
                        "#,
                    )
                    .bind(&suggestion.display_name)
                    .bind(suggestion.size_bytes)
                    .bind(&suggestion.mime_type)
                    .bind(&suggestion.content_hash)
                    .bind(suggestion.revised_at)
                    .bind(&suggestion.guessed_case_id)
                    .bind(&slots_json)
                    .bind(now)
                    .bind(&suggestion.id)
                    .execute(&mut *tx)
                    .await?;
                    stats.updated += 1;
                }
            }
        }

        tx.commit().await?;
        debug!(inserted = stats.inserted, updated = stats.updated, "upserted suggestion batch");
        Ok(stats)
    }

    /// Record a fingerprinting/download failure for a (path, revision) the
    /// listing reported. The row is retried on the next cycle; an existing
    /// non-`error` row is left untouched.
    pub async fn record_error(&self, id: &str, entry: &FileEntry, message: &str) -> Result<()> {
        let now = now_ms();
        sqlx::query(
            r#"
            INSERT INTO dossier_suggestions
                (id, remote_path, display_name, size_bytes, mime_type, content_hash,
                 revision, revised_at, guessed_case_id, guessed_slots, status, notes,
                 created_at, updated_at)
            VALUES (?, ?, ?, ?, NULL, NULL, ?, ?, NULL, '[]', 'error', ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                notes = excluded.notes,
                updated_at = excluded.updated_at
            WHERE dossier_suggestions.status = 'error'
            "#,
        )
        .bind(id)
        .bind(&entry.path)
        .bind(&entry.name)
        .bind(entry.size_bytes)
        .bind(&entry.revision)
        .bind(entry.modified_at)
        .bind(message)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Absorb a new revision marker into the existing row for the same
    /// path and bytes (a metadata-only touch). Keeps the next listing from
    /// re-downloading unchanged content.
    pub async fn refresh_revision(
        &self,
        remote_path: &str,
        content_hash: &str,
        revision: &str,
        revised_at: i64,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE dossier_suggestions
            SET revision = ?,
                revised_at = ?,
                updated_at = ?
            WHERE lower(remote_path) = lower(?) AND content_hash = ?
            "#,
        )
        .bind(revision)
        .bind(revised_at)
        .bind(now_ms())
        .bind(remote_path)
        .bind(content_hash)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get(&self, id: &str) -> Result<Option<Suggestion>> {
        let row: Option<SuggestionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM dossier_suggestions WHERE id = ?",
            SUGGESTION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Suggestion::try_from).transpose()
    }

    pub async fn list_by_status(&self, status: SuggestionStatus) -> Result<Vec<Suggestion>> {
        let rows: Vec<SuggestionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM dossier_suggestions WHERE status = ? ORDER BY revised_at DESC",
            SUGGESTION_COLUMNS
        ))
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Suggestion::try_from).collect()
    }

    /// Pending suggestions whose case guess points at the given case; feeds
    /// the per-case review panel.
    pub async fn pending_for_case(&self, case_id: &str) -> Result<Vec<Suggestion>> {
        let rows: Vec<SuggestionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM dossier_suggestions \
             WHERE status = 'pending' AND guessed_case_id = ? ORDER BY revised_at DESC",
            SUGGESTION_COLUMNS
        ))
        .bind(case_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Suggestion::try_from).collect()
    }

    /// Resolve a (possibly shortened) suggestion id. Review tooling shows
    /// truncated ids; a prefix matching more than one row is rejected.
    pub async fn resolve_id_prefix(&self, prefix: &str) -> Result<String> {
        let ids: Vec<String> = sqlx::query_scalar(
            "SELECT id FROM dossier_suggestions WHERE id LIKE ? || '%' LIMIT 2",
        )
        .bind(prefix)
        .fetch_all(&self.pool)
        .await?;
        match ids.len() {
            0 => Err(StoreError::NotFound(prefix.to_string())),
            1 => Ok(ids.into_iter().next().unwrap_or_default()),
            _ => Err(StoreError::AmbiguousId(prefix.to_string())),
        }
    }

    /// Everything the poll cycle needs to know about rows it may re-observe.
    pub async fn scan_index(&self) -> Result<Vec<ScanIndexRow>> {
        let rows: Vec<RawScanRow> = sqlx::query_as(
            "SELECT remote_path, revision, status, display_name, size_bytes, content_hash, revised_at \
             FROM dossier_suggestions",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(ScanIndexRow::try_from).collect()
    }

    /// `pending -> linked`. Any other current status is rejected and leaves
    /// the row untouched.
    pub async fn mark_linked(
        &self,
        id: &str,
        case_id: &str,
        slot: DocSlot,
        by: &str,
    ) -> Result<()> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE dossier_suggestions
            SET status = 'linked',
                linked_case_id = ?,
                linked_slot = ?,
                decided_by = ?,
                updated_at = ?
            WHERE id = ? AND status = 'pending'
            "#,
        )
        .bind(case_id)
        .bind(slot.as_str())
        .bind(by)
        .bind(now_ms())
        .bind(id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            return Err(self.transition_rejection(id).await?);
        }
        info!(id, case_id, slot = %slot, by, "suggestion linked");
        Ok(())
    }

    /// `pending -> ignored`. Records the reason, touches no case data.
    pub async fn mark_ignored(&self, id: &str, reason: &str, by: &str) -> Result<()> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE dossier_suggestions
            SET status = 'ignored',
                notes = ?,
                decided_by = ?,
                updated_at = ?
            WHERE id = ? AND status = 'pending'
            "#,
        )
        .bind(reason)
        .bind(by)
        .bind(now_ms())
        .bind(id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            return Err(self.transition_rejection(id).await?);
        }
        info!(id, by, "suggestion ignored");
        Ok(())
    }

    pub async fn stats(&self) -> Result<StoreStats> {
        let stats: StoreStats = sqlx::query_as(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE status = 'pending') as pending,
                COUNT(*) FILTER (WHERE status = 'linked') as linked,
                COUNT(*) FILTER (WHERE status = 'ignored') as ignored,
                COUNT(*) FILTER (WHERE status = 'error') as error
            FROM dossier_suggestions
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(stats)
    }

    /// Zero rows matched a guarded transition: distinguish missing from
    /// wrong-status for the caller's error message.
    async fn transition_rejection(&self, id: &str) -> Result<StoreError> {
        let status: Option<String> =
            sqlx::query_scalar("SELECT status FROM dossier_suggestions WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(match status {
            None => StoreError::NotFound(id.to_string()),
            Some(raw) => {
                let status = raw
                    .parse::<SuggestionStatus>()
                    .map_err(StoreError::Decode)?;
                StoreError::NotPending {
                    id: id.to_string(),
                    status,
                }
            }
        })
    }
}

pub(crate) fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

fn encode_slots(slots: &[SlotMatch]) -> Result<String> {
    serde_json::to_string(slots).map_err(|e| StoreError::Decode(e.to_string()))
}

// ============================================================================
// Row mapping (parse at the boundary, propagate errors)
// ============================================================================

#[derive(Debug, sqlx::FromRow)]
struct SuggestionRow {
    id: String,
    remote_path: String,
    display_name: String,
    size_bytes: i64,
    mime_type: Option<String>,
    content_hash: Option<String>,
    revision: String,
    revised_at: i64,
    guessed_case_id: Option<String>,
    guessed_slots: String,
    status: String,
    notes: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<SuggestionRow> for Suggestion {
    type Error = StoreError;

    fn try_from(row: SuggestionRow) -> Result<Self> {
        let status = row.status.parse::<SuggestionStatus>().map_err(StoreError::Decode)?;
        let guessed_slots: Vec<SlotMatch> = serde_json::from_str(&row.guessed_slots)
            .map_err(|e| StoreError::Decode(format!("guessed_slots for {}: {}", row.id, e)))?;
        Ok(Suggestion {
            id: row.id,
            remote_path: row.remote_path,
            display_name: row.display_name,
            size_bytes: row.size_bytes,
            mime_type: row.mime_type,
            content_hash: row.content_hash,
            revision: row.revision,
            revised_at: row.revised_at,
            guessed_case_id: row.guessed_case_id,
            guessed_slots,
            status,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RawScanRow {
    remote_path: String,
    revision: String,
    status: String,
    display_name: String,
    size_bytes: i64,
    content_hash: Option<String>,
    revised_at: i64,
}

impl TryFrom<RawScanRow> for ScanIndexRow {
    type Error = StoreError;

    fn try_from(row: RawScanRow) -> Result<Self> {
        let status = row.status.parse::<SuggestionStatus>().map_err(StoreError::Decode)?;
        Ok(ScanIndexRow {
            remote_path: row.remote_path,
            revision: row.revision,
            status,
            display_name: row.display_name,
            size_bytes: row.size_bytes,
            content_hash: row.content_hash,
            revised_at: row.revised_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::open_in_memory;
    use dossier_protocol::suggestion_key;

    fn sample(path: &str, revision: &str, hash: &str) -> Suggestion {
        Suggestion {
            id: suggestion_key(path, revision),
            remote_path: path.to_string(),
            display_name: path.rsplit('/').next().unwrap_or(path).to_string(),
            size_bytes: 1234,
            mime_type: Some("application/pdf".to_string()),
            content_hash: Some(hash.to_string()),
            revision: revision.to_string(),
            revised_at: 1_700_000_000_000,
            guessed_case_id: Some("case-1".to_string()),
            guessed_slots: vec![SlotMatch {
                slot: DocSlot::Birth,
                confidence: 0.5,
            }],
            status: SuggestionStatus::Pending,
            notes: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn entry(path: &str, revision: &str) -> FileEntry {
        FileEntry {
            path: path.to_string(),
            name: path.rsplit('/').next().unwrap_or(path).to_string(),
            kind: dossier_protocol::EntryKind::File,
            size_bytes: 1234,
            revision: revision.to_string(),
            modified_at: 1_700_000_000_000,
        }
    }

    async fn store() -> SuggestionStore {
        SuggestionStore::new(open_in_memory().await.unwrap())
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let store = store().await;
        let s = sample("/CASES/A1/birth.pdf", "rev-1", "hash-a");

        let first = store.upsert(&[s.clone()]).await.unwrap();
        assert_eq!(first.inserted, 1);
        assert_eq!(first.updated, 0);

        let second = store.upsert(&[s.clone()]).await.unwrap();
        assert_eq!(second.inserted, 0);
        assert_eq!(second.updated, 1);

        let pending = store.list_by_status(SuggestionStatus::Pending).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, s.id);
    }

    #[tokio::test]
    async fn test_upsert_refreshes_guesses() {
        let store = store().await;
        let mut s = sample("/CASES/A1/birth.pdf", "rev-1", "hash-a");
        store.upsert(&[s.clone()]).await.unwrap();

        s.guessed_slots = vec![SlotMatch {
            slot: DocSlot::Passport,
            confidence: 0.9,
        }];
        store.upsert(&[s.clone()]).await.unwrap();

        let got = store.get(&s.id).await.unwrap().unwrap();
        assert_eq!(got.guessed_slots[0].slot, DocSlot::Passport);
    }

    #[tokio::test]
    async fn test_upsert_never_regresses_terminal_status() {
        let store = store().await;
        let s = sample("/CASES/A1/birth.pdf", "rev-1", "hash-a");
        store.upsert(&[s.clone()]).await.unwrap();
        store
            .mark_linked(&s.id, "case-1", DocSlot::Birth, "reviewer1")
            .await
            .unwrap();

        store.upsert(&[s.clone()]).await.unwrap();

        let got = store.get(&s.id).await.unwrap().unwrap();
        assert_eq!(got.status, SuggestionStatus::Linked);
    }

    #[tokio::test]
    async fn test_error_row_resurrects_to_pending() {
        let store = store().await;
        let s = sample("/CASES/A1/birth.pdf", "rev-1", "hash-a");
        store
            .record_error(&s.id, &entry("/CASES/A1/birth.pdf", "rev-1"), "download timed out")
            .await
            .unwrap();

        let got = store.get(&s.id).await.unwrap().unwrap();
        assert_eq!(got.status, SuggestionStatus::Error);
        assert_eq!(got.notes.as_deref(), Some("download timed out"));
        assert!(got.content_hash.is_none());

        store.upsert(&[s.clone()]).await.unwrap();
        let got = store.get(&s.id).await.unwrap().unwrap();
        assert_eq!(got.status, SuggestionStatus::Pending);
        assert!(got.notes.is_none());
        assert_eq!(got.content_hash.as_deref(), Some("hash-a"));
    }

    #[tokio::test]
    async fn test_record_error_leaves_pending_rows_alone() {
        let store = store().await;
        let s = sample("/CASES/A1/birth.pdf", "rev-1", "hash-a");
        store.upsert(&[s.clone()]).await.unwrap();

        store
            .record_error(&s.id, &entry("/CASES/A1/birth.pdf", "rev-1"), "late failure")
            .await
            .unwrap();

        let got = store.get(&s.id).await.unwrap().unwrap();
        assert_eq!(got.status, SuggestionStatus::Pending);
        assert!(got.notes.is_none());
    }

    #[tokio::test]
    async fn test_terminal_transition_happens_exactly_once() {
        let store = store().await;
        let s = sample("/CASES/A1/birth.pdf", "rev-1", "hash-a");
        store.upsert(&[s.clone()]).await.unwrap();

        store
            .mark_linked(&s.id, "case-1", DocSlot::Birth, "reviewer1")
            .await
            .unwrap();

        let again = store
            .mark_linked(&s.id, "case-1", DocSlot::Birth, "reviewer1")
            .await;
        assert!(matches!(
            again,
            Err(StoreError::NotPending {
                status: SuggestionStatus::Linked,
                ..
            })
        ));

        let ignore = store.mark_ignored(&s.id, "dupe", "reviewer2").await;
        assert!(matches!(ignore, Err(StoreError::NotPending { .. })));
    }

    #[tokio::test]
    async fn test_transition_on_missing_id() {
        let store = store().await;
        let err = store
            .mark_ignored("no-such-id", "reason", "reviewer1")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_pending_for_case() {
        let store = store().await;
        let mut a = sample("/CASES/A1/birth.pdf", "rev-1", "hash-a");
        a.guessed_case_id = Some("case-1".to_string());
        let mut b = sample("/CASES/B2/passport.jpg", "rev-1", "hash-b");
        b.guessed_case_id = Some("case-2".to_string());
        store.upsert(&[a.clone(), b]).await.unwrap();

        let for_case = store.pending_for_case("case-1").await.unwrap();
        assert_eq!(for_case.len(), 1);
        assert_eq!(for_case[0].id, a.id);
        assert!(store.pending_for_case("case-9").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_scan_index_and_stats() {
        let store = store().await;
        let a = sample("/CASES/A1/birth.pdf", "rev-1", "hash-a");
        let b = sample("/CASES/B2/passport.jpg", "rev-1", "hash-b");
        store.upsert(&[a.clone(), b.clone()]).await.unwrap();
        store
            .mark_ignored(&b.id, "not relevant", "reviewer1")
            .await
            .unwrap();

        let index = store.scan_index().await.unwrap();
        assert_eq!(index.len(), 2);
        assert!(index
            .iter()
            .any(|r| r.remote_path == a.remote_path && r.status == SuggestionStatus::Pending));

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.ignored, 1);
        assert_eq!(stats.linked, 0);
        assert_eq!(stats.error, 0);
    }
}
