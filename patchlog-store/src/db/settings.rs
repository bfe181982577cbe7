//! Key/value settings persisted alongside the records

use std::path::Path;

use patchlog_common::api::generate_secret;
use sqlx::SqlitePool;
use tracing::info;

use super::DbError;

const INGEST_SECRET_KEY: &str = "ingest_secret";

/// Ingest secret read from the settings table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSecret {
    pub value: String,
    /// True when this call created the secret
    pub generated: bool,
}

/// Load the ingest secret from the settings table
///
/// Generates and stores a random secret on first use (or when the stored
/// value is NULL/empty). The conditional upsert followed by a re-read keeps
/// concurrent first starts on the same value.
pub async fn load_ingest_secret(pool: &SqlitePool) -> Result<StoredSecret, DbError> {
    if let Some(value) = read_setting(pool, INGEST_SECRET_KEY).await? {
        return Ok(StoredSecret {
            value,
            generated: false,
        });
    }

    sqlx::query(
        "INSERT INTO settings (key, value) VALUES (?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
         WHERE settings.value IS NULL OR settings.value = ''",
    )
    .bind(INGEST_SECRET_KEY)
    .bind(generate_secret())
    .execute(pool)
    .await?;
    info!(
        "Generated new ingest secret (settings table, key '{}')",
        INGEST_SECRET_KEY
    );

    let value = read_setting(pool, INGEST_SECRET_KEY)
        .await?
        .ok_or(DbError::Sqlx(sqlx::Error::RowNotFound))?;
    Ok(StoredSecret {
        value,
        generated: true,
    })
}

/// Shell command an operator can run to read the stored ingest secret
pub fn ingest_secret_hint(db_path: &Path) -> String {
    format!(
        "sqlite3 '{}' \"SELECT value FROM settings WHERE key = '{}'\"",
        db_path.display(),
        INGEST_SECRET_KEY
    )
}

async fn read_setting(pool: &SqlitePool, key: &str) -> Result<Option<String>, DbError> {
    let value: Option<Option<String>> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(pool)
            .await?;

    Ok(value.flatten().filter(|v| !v.is_empty()))
}
