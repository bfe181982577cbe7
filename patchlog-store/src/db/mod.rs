//! Database access layer for patchlog-store
//!
//! Schema is created idempotently on every open. Optional change lists are
//! stored as SQL NULL when absent and as JSON array text when present, so
//! "not recorded" and "recorded as none" survive the round trip.

use std::path::Path;

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;

mod settings;
mod updates;

pub use settings::{ingest_secret_hint, load_ingest_secret, StoredSecret};
pub use updates::{fetch_updates, insert_batch};

/// Storage errors
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A record with this versionName is already stored
    #[error("versionName {0} already exists")]
    Duplicate(String),

    /// A stored list column does not hold a JSON string array
    #[error("Corrupt {column} for record {id}: {reason}")]
    Corrupt {
        id: i64,
        column: &'static str,
        reason: String,
    },
}

/// Open (creating if needed) the database at `db_path`
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, DbError> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // WAL lets readers proceed while an import batch is being written
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Open a private in-memory database
///
/// Limited to one connection that is never recycled: every SQLite
/// `:memory:` connection is a separate database.
pub async fn init_memory_database() -> Result<SqlitePool, DbError> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;

    create_schema(&pool).await?;

    Ok(pool)
}

async fn create_schema(pool: &SqlitePool) -> Result<(), DbError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS updates (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            version_name TEXT NOT NULL UNIQUE,
            release_date TEXT NOT NULL,
            year TEXT NOT NULL,
            major_features TEXT NOT NULL,
            weapon_changes TEXT,
            map_changes TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_updates_year ON updates(year)")
        .execute(pool)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
