//! Append-only audit log.
//!
//! One row per human/automatic decision. Rows are never updated or
//! deleted; this table is the sole source of truth for who decided what
//! and when, so the API exposes append and reads only.

use crate::error::{Result, StoreError};
use crate::suggestions::now_ms;
use dossier_protocol::{AuditAction, AuditEntry, DocSlot};
use sqlx::{Pool, Sqlite};
use tracing::info;
use uuid::Uuid;

const AUDIT_COLUMNS: &str =
    "id, action, case_id, slot_key, remote_path, content_hash, at, actor, reason";

pub struct AuditLog {
    pool: Pool<Sqlite>,
}

impl AuditLog {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Build and append one audit row; returns the stored entry.
    pub async fn append(
        &self,
        action: AuditAction,
        case_id: Option<&str>,
        slot: Option<DocSlot>,
        remote_path: &str,
        content_hash: Option<&str>,
        by: &str,
        reason: Option<&str>,
    ) -> Result<AuditEntry> {
        let entry = AuditEntry {
            id: Uuid::new_v4().to_string(),
            action,
            case_id: case_id.map(str::to_string),
            slot,
            remote_path: remote_path.to_string(),
            content_hash: content_hash.map(str::to_string),
            at: now_ms(),
            by: by.to_string(),
            reason: reason.map(str::to_string),
        };

        sqlx::query(
            r#"
            INSERT INTO dossier_audit
                (id, action, case_id, slot_key, remote_path, content_hash, at, actor, reason)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.id)
        .bind(entry.action.as_str())
        .bind(&entry.case_id)
        .bind(entry.slot.map(|s| s.as_str()))
        .bind(&entry.remote_path)
        .bind(&entry.content_hash)
        .bind(entry.at)
        .bind(&entry.by)
        .bind(&entry.reason)
        .execute(&self.pool)
        .await?;

        info!(action = %entry.action, path = %entry.remote_path, by = %entry.by, "audit entry appended");
        Ok(entry)
    }

    /// Most recent entries, newest first.
    pub async fn recent(&self, limit: i64) -> Result<Vec<AuditEntry>> {
        let rows: Vec<AuditRow> = sqlx::query_as(&format!(
            "SELECT {} FROM dossier_audit ORDER BY at DESC, id DESC LIMIT ?",
            AUDIT_COLUMNS
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(AuditEntry::try_from).collect()
    }

    pub async fn for_case(&self, case_id: &str) -> Result<Vec<AuditEntry>> {
        let rows: Vec<AuditRow> = sqlx::query_as(&format!(
            "SELECT {} FROM dossier_audit WHERE case_id = ? ORDER BY at DESC, id DESC",
            AUDIT_COLUMNS
        ))
        .bind(case_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(AuditEntry::try_from).collect()
    }

    pub async fn for_path(&self, remote_path: &str) -> Result<Vec<AuditEntry>> {
        let rows: Vec<AuditRow> = sqlx::query_as(&format!(
            "SELECT {} FROM dossier_audit WHERE remote_path = ? ORDER BY at DESC, id DESC",
            AUDIT_COLUMNS
        ))
        .bind(remote_path)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(AuditEntry::try_from).collect()
    }

    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM dossier_audit")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AuditRow {
    id: String,
    action: String,
    case_id: Option<String>,
    slot_key: Option<String>,
    remote_path: String,
    content_hash: Option<String>,
    at: i64,
    actor: String,
    reason: Option<String>,
}

impl TryFrom<AuditRow> for AuditEntry {
    type Error = StoreError;

    fn try_from(row: AuditRow) -> Result<Self> {
        let action = row.action.parse::<AuditAction>().map_err(StoreError::Decode)?;
        let slot = row
            .slot_key
            .as_deref()
            .map(|s| s.parse::<DocSlot>().map_err(StoreError::Decode))
            .transpose()?;
        Ok(AuditEntry {
            id: row.id,
            action,
            case_id: row.case_id,
            slot,
            remote_path: row.remote_path,
            content_hash: row.content_hash,
            at: row.at,
            by: row.actor,
            reason: row.reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::open_in_memory;

    async fn log() -> AuditLog {
        AuditLog::new(open_in_memory().await.unwrap())
    }

    #[tokio::test]
    async fn test_append_and_read_back() {
        let log = log().await;
        let entry = log
            .append(
                AuditAction::Linked,
                Some("case-1"),
                Some(DocSlot::Birth),
                "/CASES/A1/birth.pdf",
                Some("hash-a"),
                "reviewer1",
                None,
            )
            .await
            .unwrap();

        let recent = log.recent(10).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0], entry);
        assert_eq!(log.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_ignore_entry_has_no_case_data() {
        let log = log().await;
        log.append(
            AuditAction::Ignored,
            None,
            None,
            "/CASES/A1/blurry.jpg",
            Some("hash-b"),
            "reviewer2",
            Some("unreadable scan"),
        )
        .await
        .unwrap();

        let recent = log.recent(10).await.unwrap();
        assert_eq!(recent[0].action, AuditAction::Ignored);
        assert!(recent[0].case_id.is_none());
        assert!(recent[0].slot.is_none());
        assert_eq!(recent[0].reason.as_deref(), Some("unreadable scan"));
    }

    #[tokio::test]
    async fn test_case_filter() {
        let log = log().await;
        log.append(AuditAction::Linked, Some("case-1"), Some(DocSlot::Birth), "/a", Some("h1"), "r", None)
            .await
            .unwrap();
        log.append(AuditAction::Linked, Some("case-2"), Some(DocSlot::Passport), "/b", Some("h2"), "r", None)
            .await
            .unwrap();

        let for_case = log.for_case("case-1").await.unwrap();
        assert_eq!(for_case.len(), 1);
        assert_eq!(for_case[0].remote_path, "/a");
    }
}
