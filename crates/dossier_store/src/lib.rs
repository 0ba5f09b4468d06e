//! Dossier Store - persistent state for the reconciliation engine.
//!
//! All suggestion state flows through [`SuggestionStore`]; every decision
//! flows through [`AuditLog`]. Both live in one SQLite database.
//!
//! Concurrency control is centralized here: status transitions are single
//! atomic `UPDATE ... WHERE status = 'pending'` statements, so reviewer
//! calls arriving mid-sync can never race an upsert into a double
//! transition, and upserts are idempotent and commutative per id.

pub mod audit;
pub mod error;
pub mod schema;
pub mod suggestions;

pub use audit::AuditLog;
pub use error::{Result, StoreError};
pub use schema::init_schema;
pub use suggestions::{ScanIndexRow, StoreStats, SuggestionStore, UpsertStats};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;

/// Open (creating if missing) the SQLite database at `path` and apply the
/// schema.
pub async fn open_database(path: &Path) -> Result<Pool<Sqlite>> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new().connect_with(options).await?;
    init_schema(&pool).await?;
    Ok(pool)
}

/// Open an in-memory database with the schema applied. Test helper.
pub async fn open_in_memory() -> Result<Pool<Sqlite>> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    init_schema(&pool).await?;
    Ok(pool)
}
