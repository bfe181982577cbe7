//! Update record queries
//!
//! Records come back in insertion order (`ORDER BY id ASC`). Batch inserts run
//! in a single transaction: either every record of the batch is stored or
//! none is.

use patchlog_common::{NewUpdateRecord, UpdateRecord};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use super::DbError;

/// Fetch records, optionally limited to one year
pub async fn fetch_updates(
    pool: &SqlitePool,
    year: Option<&str>,
) -> Result<Vec<UpdateRecord>, DbError> {
    let rows = match year {
        Some(year) => {
            sqlx::query(
                "SELECT id, version_name, release_date, year, major_features, weapon_changes, map_changes
                 FROM updates
                 WHERE year = ?
                 ORDER BY id ASC",
            )
            .bind(year)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query(
                "SELECT id, version_name, release_date, year, major_features, weapon_changes, map_changes
                 FROM updates
                 ORDER BY id ASC",
            )
            .fetch_all(pool)
            .await?
        }
    };

    debug!(year = ?year, count = rows.len(), "Fetched update records");

    rows.iter().map(row_to_record).collect()
}

/// Insert a batch atomically, returning the assigned ids in batch order
///
/// Fails with [`DbError::Duplicate`] if any versionName already exists; the
/// transaction is rolled back and nothing from the batch is stored.
pub async fn insert_batch(
    pool: &SqlitePool,
    records: &[NewUpdateRecord],
) -> Result<Vec<i64>, DbError> {
    let mut tx = pool.begin().await?;
    let mut ids = Vec::with_capacity(records.len());

    for record in records {
        let existing: Option<i64> =
            sqlx::query_scalar("SELECT id FROM updates WHERE version_name = ?")
                .bind(&record.version_name)
                .fetch_optional(&mut *tx)
                .await?;
        if existing.is_some() {
            // Dropping `tx` rolls back earlier inserts of this batch
            return Err(DbError::Duplicate(record.version_name.clone()));
        }

        let result = sqlx::query(
            r#"
            INSERT INTO updates (
                version_name, release_date, year,
                major_features, weapon_changes, map_changes
            )
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.version_name)
        .bind(&record.release_date)
        .bind(&record.year)
        .bind(encode_list(&record.major_features))
        .bind(record.weapon_changes.as_deref().map(encode_list))
        .bind(record.map_changes.as_deref().map(encode_list))
        .execute(&mut *tx)
        .await
        .map_err(|e| match e.as_database_error() {
            Some(db_err) if db_err.is_unique_violation() => {
                DbError::Duplicate(record.version_name.clone())
            }
            _ => DbError::Sqlx(e),
        })?;

        ids.push(result.last_insert_rowid());
    }

    tx.commit().await?;

    Ok(ids)
}

fn encode_list(items: &[String]) -> String {
    // A Vec<String> always serializes
    serde_json::Value::from(items.to_vec()).to_string()
}

fn decode_list(id: i64, column: &'static str, raw: &str) -> Result<Vec<String>, DbError> {
    serde_json::from_str(raw).map_err(|e| DbError::Corrupt {
        id,
        column,
        reason: e.to_string(),
    })
}

fn row_to_record(row: &SqliteRow) -> Result<UpdateRecord, DbError> {
    let id: i64 = row.try_get("id")?;
    let major_features: String = row.try_get("major_features")?;
    let weapon_changes: Option<String> = row.try_get("weapon_changes")?;
    let map_changes: Option<String> = row.try_get("map_changes")?;

    Ok(UpdateRecord {
        id,
        version_name: row.try_get("version_name")?,
        release_date: row.try_get("release_date")?,
        year: row.try_get("year")?,
        major_features: decode_list(id, "major_features", &major_features)?,
        weapon_changes: weapon_changes
            .map(|raw| decode_list(id, "weapon_changes", &raw))
            .transpose()?,
        map_changes: map_changes
            .map(|raw| decode_list(id, "map_changes", &raw))
            .transpose()?,
    })
}
