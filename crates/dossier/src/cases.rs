//! SQLite-backed case repository for standalone deployments.
//!
//! Production installs point the engine at the real case-management
//! backend; this implementation keeps cases and slot attachments in the
//! same database file so the CLI works end-to-end on its own.

use async_trait::async_trait;
use chrono::Utc;
use dossier_engine::{CaseRepoError, CaseRepository};
use dossier_protocol::{CaseRef, DocSlot, SlotAttachment};
use sqlx::{Pool, Sqlite};
use uuid::Uuid;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS dossier_cases (
    id TEXT PRIMARY KEY,
    code TEXT NOT NULL UNIQUE,
    display_name TEXT NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS dossier_case_documents (
    case_id TEXT NOT NULL REFERENCES dossier_cases(id),
    slot_key TEXT NOT NULL,
    remote_path TEXT NOT NULL,
    content_hash TEXT NOT NULL,
    mime_type TEXT,
    size_bytes INTEGER NOT NULL,
    attached_at INTEGER NOT NULL,
    attached_by TEXT NOT NULL,
    PRIMARY KEY (case_id, slot_key)
);
"#;

pub struct SqliteCaseRepo {
    pool: Pool<Sqlite>,
}

impl SqliteCaseRepo {
    pub async fn new(pool: Pool<Sqlite>) -> Result<Self, CaseRepoError> {
        for statement in SCHEMA_SQL.split(';') {
            let statement = statement.trim();
            if statement.is_empty() {
                continue;
            }
            sqlx::query(statement)
                .execute(&pool)
                .await
                .map_err(storage)?;
        }
        Ok(Self { pool })
    }

    /// Register a case under an explicit code.
    pub async fn add_case(&self, code: &str, display_name: &str) -> Result<CaseRef, CaseRepoError> {
        let case = CaseRef {
            id: Uuid::new_v4().to_string(),
            code: code.to_string(),
            display_name: display_name.to_string(),
        };
        sqlx::query(
            "INSERT INTO dossier_cases (id, code, display_name, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&case.id)
        .bind(&case.code)
        .bind(&case.display_name)
        .bind(Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        Ok(case)
    }
}

#[async_trait]
impl CaseRepository for SqliteCaseRepo {
    async fn list_cases(&self) -> Result<Vec<CaseRef>, CaseRepoError> {
        let rows: Vec<(String, String, String)> =
            sqlx::query_as("SELECT id, code, display_name FROM dossier_cases ORDER BY code")
                .fetch_all(&self.pool)
                .await
                .map_err(storage)?;
        Ok(rows
            .into_iter()
            .map(|(id, code, display_name)| CaseRef {
                id,
                code,
                display_name,
            })
            .collect())
    }

    async fn document_in_slot(
        &self,
        case_id: &str,
        slot: DocSlot,
    ) -> Result<Option<SlotAttachment>, CaseRepoError> {
        let row: Option<AttachmentRow> = sqlx::query_as(
            "SELECT remote_path, content_hash, mime_type, size_bytes, attached_at, attached_by \
             FROM dossier_case_documents WHERE case_id = ? AND slot_key = ?",
        )
        .bind(case_id)
        .bind(slot.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?;
        Ok(row.map(AttachmentRow::into_attachment))
    }

    async fn attach_document(
        &self,
        case_id: &str,
        slot: DocSlot,
        attachment: SlotAttachment,
    ) -> Result<(), CaseRepoError> {
        let known: Option<i64> = sqlx::query_scalar("SELECT 1 FROM dossier_cases WHERE id = ?")
            .bind(case_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;
        if known.is_none() {
            return Err(CaseRepoError::NotFound(case_id.to_string()));
        }

        sqlx::query(
            r#"
            INSERT INTO dossier_case_documents
                (case_id, slot_key, remote_path, content_hash, mime_type, size_bytes,
                 attached_at, attached_by)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(case_id, slot_key) DO UPDATE SET
                remote_path = excluded.remote_path,
                content_hash = excluded.content_hash,
                mime_type = excluded.mime_type,
                size_bytes = excluded.size_bytes,
                attached_at = excluded.attached_at,
                attached_by = excluded.attached_by
            "#,
        )
        .bind(case_id)
        .bind(slot.as_str())
        .bind(&attachment.remote_path)
        .bind(&attachment.content_hash)
        .bind(&attachment.mime_type)
        .bind(attachment.size_bytes)
        .bind(attachment.attached_at)
        .bind(&attachment.attached_by)
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        Ok(())
    }

    async fn create_case(&self, display_name: &str) -> Result<CaseRef, CaseRepoError> {
        // Derive a short unique code; staff can rename later.
        let id = Uuid::new_v4().to_string();
        let code = format!("C{}", &id[..6].to_uppercase());
        let case = CaseRef {
            id,
            code,
            display_name: display_name.to_string(),
        };
        sqlx::query(
            "INSERT INTO dossier_cases (id, code, display_name, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&case.id)
        .bind(&case.code)
        .bind(&case.display_name)
        .bind(Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        Ok(case)
    }
}

fn storage(e: sqlx::Error) -> CaseRepoError {
    CaseRepoError::Storage(e.to_string())
}

#[derive(sqlx::FromRow)]
struct AttachmentRow {
    remote_path: String,
    content_hash: String,
    mime_type: Option<String>,
    size_bytes: i64,
    attached_at: i64,
    attached_by: String,
}

impl AttachmentRow {
    fn into_attachment(self) -> SlotAttachment {
        SlotAttachment {
            remote_path: self.remote_path,
            content_hash: self.content_hash,
            mime_type: self.mime_type,
            size_bytes: self.size_bytes,
            attached_at: self.attached_at,
            attached_by: self.attached_by,
        }
    }
}
