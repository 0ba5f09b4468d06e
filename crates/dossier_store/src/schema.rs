//! Database schema for the suggestion queue and audit log.
//!
//! Note: all timestamps are stored as INTEGER (milliseconds since Unix
//! epoch). `guessed_slots` is a JSON array of `{slot, confidence}` ordered
//! highest confidence first.

use crate::error::Result;
use sqlx::{Pool, Sqlite};

const SCHEMA_SQL: &str = r#"
-- Suggestions: one row per distinct physical file revision
CREATE TABLE IF NOT EXISTS dossier_suggestions (
    id TEXT PRIMARY KEY,
    remote_path TEXT NOT NULL,
    display_name TEXT NOT NULL,
    size_bytes INTEGER NOT NULL,
    mime_type TEXT,
    content_hash TEXT,                      -- NULL only while status = 'error'
    revision TEXT NOT NULL,
    revised_at INTEGER NOT NULL,
    guessed_case_id TEXT,
    guessed_slots TEXT NOT NULL DEFAULT '[]',
    status TEXT NOT NULL DEFAULT 'pending'
        CHECK (status IN ('pending', 'linked', 'ignored', 'error')),
    notes TEXT,
    linked_case_id TEXT,
    linked_slot TEXT,
    decided_by TEXT,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    UNIQUE(remote_path, revision)
);

CREATE INDEX IF NOT EXISTS idx_dossier_suggestions_status
    ON dossier_suggestions(status);
CREATE INDEX IF NOT EXISTS idx_dossier_suggestions_case
    ON dossier_suggestions(guessed_case_id);
CREATE INDEX IF NOT EXISTS idx_dossier_suggestions_hash
    ON dossier_suggestions(content_hash);

-- Audit: append-only decision trail - rows are never updated or deleted
CREATE TABLE IF NOT EXISTS dossier_audit (
    id TEXT PRIMARY KEY,
    action TEXT NOT NULL
        CHECK (action IN ('linked', 'ignored', 'new-case')),
    case_id TEXT,
    slot_key TEXT,
    remote_path TEXT NOT NULL,
    content_hash TEXT,
    at INTEGER NOT NULL,
    actor TEXT NOT NULL,
    reason TEXT
);

CREATE INDEX IF NOT EXISTS idx_dossier_audit_case
    ON dossier_audit(case_id);
CREATE INDEX IF NOT EXISTS idx_dossier_audit_path
    ON dossier_audit(remote_path);
"#;

/// Apply the schema. Idempotent.
pub async fn init_schema(pool: &Pool<Sqlite>) -> Result<()> {
    for statement in SCHEMA_SQL.split(';') {
        let statement = statement.trim();
        if statement.is_empty() {
            continue;
        }
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}
