//! Year Index Builder
//!
//! Distinct years of a record list, newest first, for populating the year
//! filter controls. Recompute whenever the record list changes.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use patchlog_common::UpdateRecord;

/// Distinct `year` values sorted descending as integers
///
/// Years that do not parse as integers sort after all numeric years, in
/// lexical order among themselves.
pub fn build_year_options(records: &[UpdateRecord]) -> Vec<String> {
    let distinct: BTreeSet<&str> = records.iter().map(|r| r.year.as_str()).collect();

    let mut years: Vec<String> = distinct.into_iter().map(str::to_string).collect();
    years.sort_by(|a, b| compare_desc(a, b));
    years
}

/// `existing` options plus the years of `records`, in the same order
/// [`build_year_options`] uses
pub fn merge_year_options(existing: &[String], records: &[UpdateRecord]) -> Vec<String> {
    let distinct: BTreeSet<&str> = existing
        .iter()
        .map(String::as_str)
        .chain(records.iter().map(|r| r.year.as_str()))
        .collect();

    let mut years: Vec<String> = distinct.into_iter().map(str::to_string).collect();
    years.sort_by(|a, b| compare_desc(a, b));
    years
}

fn compare_desc(a: &str, b: &str) -> Ordering {
    match (a.parse::<u32>(), b.parse::<u32>()) {
        (Ok(x), Ok(y)) => y.cmp(&x).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}
