//! Client-Side Filter Engine
//!
//! Pure, synchronous narrowing of an already-fetched record list. Safe to
//! re-run on every keystroke: no store access, input never mutated, input
//! order preserved.

use patchlog_common::UpdateRecord;

/// Records whose searchable fields contain `query`, case-insensitively
///
/// An empty query matches every record.
pub fn filter_by_search(records: &[UpdateRecord], query: &str) -> Vec<UpdateRecord> {
    if query.is_empty() {
        return records.to_vec();
    }

    let needle = query.to_lowercase();
    records
        .iter()
        .filter(|record| matches_lowercase(record, &needle))
        .cloned()
        .collect()
}

/// Whether a single record matches `query`
///
/// Searched fields: `versionName`, every `majorFeatures` entry, and the
/// `weaponChanges` / `mapChanges` entries when those lists are present.
pub fn matches_query(record: &UpdateRecord, query: &str) -> bool {
    query.is_empty() || matches_lowercase(record, &query.to_lowercase())
}

fn matches_lowercase(record: &UpdateRecord, needle: &str) -> bool {
    let contains = |text: &String| text.to_lowercase().contains(needle);

    contains(&record.version_name)
        || record.major_features.iter().any(contains)
        || record.weapon_changes.iter().flatten().any(contains)
        || record.map_changes.iter().flatten().any(contains)
}
