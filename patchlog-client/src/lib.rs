//! patchlog-client library - query, filter and ingestion core
//!
//! The five operations the presentation layer may call:
//! - [`QueryService::fetch_updates`] fetch records for an optional year
//! - [`filter_by_search`] case-insensitive substring narrowing
//! - [`build_year_options`] distinct years, newest first
//! - [`IngestionGate::authorize`] shared-secret check
//! - [`IngestionGate::ingest`] forward a batch to the record store
//!
//! [`UpdateFeed`] holds the caller's interaction state and guards against
//! out-of-order fetch resolution.

pub mod feed;
pub mod filter;
mod http;
pub mod ingest;
pub mod query;
pub mod years;

pub use feed::{ApplyOutcome, FeedController, FeedStatus, FetchTicket, UpdateFeed};
pub use filter::{filter_by_search, matches_query};
pub use ingest::{
    Authorized, GateState, HttpRecordSink, IngestionError, IngestionGate, ParsedPayload,
    RecordSink, Unauthorized,
};
pub use query::{FetchError, QueryService, UpdateSource};
pub use years::{build_year_options, merge_year_options};
