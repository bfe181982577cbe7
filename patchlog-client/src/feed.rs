//! Update Feed
//!
//! Caller-side interaction state: selected year, search text, the current
//! record list and its year options. Every year selection issues a
//! [`FetchTicket`] carrying a generation number; a fetch result is applied
//! only if its ticket is still the newest, so a slow response for an old
//! selection can never overwrite a newer one.
//!
//! While a fetch is outstanding, or after it failed, [`UpdateFeed::visible`]
//! shows nothing: a list is only visible under the year it was fetched for.

use patchlog_common::UpdateRecord;
use tokio::sync::Mutex;
use tracing::debug;

use crate::filter::filter_by_search;
use crate::query::{FetchError, UpdateSource};
use crate::years::{build_year_options, merge_year_options};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FeedStatus {
    /// Nothing requested yet
    #[default]
    Idle,
    Loading,
    Ready,
    Failed(String),
}

/// Identifies one fetch issued by [`UpdateFeed::select_year`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    year: Option<String>,
}

impl FetchTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn year(&self) -> Option<&str> {
        self.year.as_deref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// A newer selection was made after this ticket was issued; dropped
    Superseded,
}

/// Records of the last successful fetch and the year they were fetched for
#[derive(Debug)]
struct LoadedRecords {
    year: Option<String>,
    records: Vec<UpdateRecord>,
}

#[derive(Debug, Default)]
pub struct UpdateFeed {
    generation: u64,
    selected_year: Option<String>,
    search: String,
    loaded: Option<LoadedRecords>,
    year_options: Vec<String>,
    status: FeedStatus,
}

impl UpdateFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Change the year filter and issue the ticket for the fetch it needs
    pub fn select_year(&mut self, year: Option<&str>) -> FetchTicket {
        self.generation += 1;
        self.selected_year = year.map(str::to_string);
        self.status = FeedStatus::Loading;

        FetchTicket {
            generation: self.generation,
            year: self.selected_year.clone(),
        }
    }

    /// Apply a fetch result if `ticket` is still current
    ///
    /// An unfiltered result replaces the year options; a year-filtered one
    /// only adds to them, so the options never shrink to the selected year.
    pub fn apply(
        &mut self,
        ticket: &FetchTicket,
        result: Result<Vec<UpdateRecord>, FetchError>,
    ) -> ApplyOutcome {
        if ticket.generation != self.generation {
            debug!(
                ticket = ticket.generation,
                current = self.generation,
                "Discarding superseded fetch result"
            );
            return ApplyOutcome::Superseded;
        }

        match result {
            Ok(records) => {
                self.year_options = match ticket.year() {
                    None => build_year_options(&records),
                    Some(_) => merge_year_options(&self.year_options, &records),
                };
                self.loaded = Some(LoadedRecords {
                    year: ticket.year.clone(),
                    records,
                });
                self.status = FeedStatus::Ready;
            }
            Err(e) => {
                self.status = FeedStatus::Failed(e.to_string());
            }
        }
        ApplyOutcome::Applied
    }

    /// Search text changes never trigger a fetch
    pub fn set_search(&mut self, query: &str) {
        self.search = query.to_string();
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn selected_year(&self) -> Option<&str> {
        self.selected_year.as_deref()
    }

    /// Records for the selected year after the search filter
    ///
    /// `None` unless the feed is `Ready` with a list fetched for the
    /// currently selected year.
    pub fn visible(&self) -> Option<Vec<UpdateRecord>> {
        if self.status != FeedStatus::Ready {
            return None;
        }
        self.loaded
            .as_ref()
            .filter(|loaded| loaded.year == self.selected_year)
            .map(|loaded| filter_by_search(&loaded.records, &self.search))
    }

    /// The last successfully fetched list, search-filtered, with the year
    /// it was fetched for
    ///
    /// Unlike [`Self::visible`] this ignores the current selection and
    /// status; callers must label it with the returned year, not the
    /// selected one.
    pub fn last_loaded(&self) -> Option<(Option<&str>, Vec<UpdateRecord>)> {
        self.loaded.as_ref().map(|loaded| {
            (
                loaded.year.as_deref(),
                filter_by_search(&loaded.records, &self.search),
            )
        })
    }

    pub fn year_options(&self) -> &[String] {
        &self.year_options
    }

    pub fn status(&self) -> FeedStatus {
        self.status.clone()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Drives an [`UpdateFeed`] against an [`UpdateSource`]
///
/// Safe to share between tasks; the lock is never held across a fetch.
pub struct FeedController<S> {
    source: S,
    feed: Mutex<UpdateFeed>,
}

impl<S: UpdateSource> FeedController<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            feed: Mutex::new(UpdateFeed::new()),
        }
    }

    /// Select `year` and run exactly one fetch for it
    pub async fn select_year(&self, year: Option<&str>) -> ApplyOutcome {
        let ticket = self.feed.lock().await.select_year(year);
        let result = self.source.fetch(ticket.year()).await;
        self.feed.lock().await.apply(&ticket, result)
    }

    pub async fn set_search(&self, query: &str) {
        self.feed.lock().await.set_search(query);
    }

    pub async fn visible(&self) -> Option<Vec<UpdateRecord>> {
        self.feed.lock().await.visible()
    }

    pub async fn last_loaded(&self) -> Option<(Option<String>, Vec<UpdateRecord>)> {
        self.feed
            .lock()
            .await
            .last_loaded()
            .map(|(year, records)| (year.map(str::to_string), records))
    }

    pub async fn year_options(&self) -> Vec<String> {
        self.feed.lock().await.year_options().to_vec()
    }

    pub async fn status(&self) -> FeedStatus {
        self.feed.lock().await.status()
    }

    pub async fn selected_year(&self) -> Option<String> {
        self.feed.lock().await.selected_year().map(str::to_string)
    }
}
