//! Update record model
//!
//! One versioned changelog entry. The wire encoding is JSON with camelCase
//! field names. `weaponChanges` and `mapChanges` distinguish "not recorded"
//! (`None`, omitted on the wire) from "recorded as none" (`Some(vec![])`,
//! serialized as `[]`).

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Update record as returned by the record store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRecord {
    /// Store-assigned identifier
    pub id: i64,
    /// Version label, e.g. "2.5.0"
    pub version_name: String,
    /// Display string, e.g. "Mar 2024"
    pub release_date: String,
    /// Four-digit release year
    pub year: String,
    pub major_features: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weapon_changes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_changes: Option<Vec<String>>,
}

/// Update record as submitted for ingestion
///
/// Same shape as [`UpdateRecord`] without the `id`. An `id` present in the
/// incoming JSON is ignored, since identifiers are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUpdateRecord {
    pub version_name: String,
    pub release_date: String,
    pub year: String,
    pub major_features: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weapon_changes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_changes: Option<Vec<String>>,
}

impl NewUpdateRecord {
    /// Attach a store-assigned id
    pub fn with_id(self, id: i64) -> UpdateRecord {
        UpdateRecord {
            id,
            version_name: self.version_name,
            release_date: self.release_date,
            year: self.year,
            major_features: self.major_features,
            weapon_changes: self.weapon_changes,
            map_changes: self.map_changes,
        }
    }

    /// Check the fields the store relies on
    pub fn validate(&self) -> Result<()> {
        if self.version_name.trim().is_empty() {
            return Err(Error::InvalidInput("versionName must not be empty".to_string()));
        }
        if !is_valid_year(&self.year) {
            return Err(Error::InvalidInput(format!(
                "year for {} must be four digits, got {:?}",
                self.version_name, self.year
            )));
        }
        Ok(())
    }
}

/// Validate a whole ingestion batch
///
/// Every record must pass [`NewUpdateRecord::validate`] and version names
/// must be unique within the batch.
pub fn validate_batch(records: &[NewUpdateRecord]) -> Result<()> {
    let mut seen = HashSet::new();
    for (index, record) in records.iter().enumerate() {
        if let Err(e) = record.validate() {
            let reason = match e {
                Error::InvalidInput(reason) => reason,
                other => other.to_string(),
            };
            return Err(Error::InvalidInput(format!("record {}: {}", index, reason)));
        }
        if !seen.insert(record.version_name.as_str()) {
            return Err(Error::InvalidInput(format!(
                "record {}: duplicate versionName {} in batch",
                index, record.version_name
            )));
        }
    }
    Ok(())
}

/// True when `year` is exactly four ASCII digits
pub fn is_valid_year(year: &str) -> bool {
    year.len() == 4 && year.bytes().all(|b| b.is_ascii_digit())
}
