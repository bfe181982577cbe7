//! Query Service
//!
//! Translates an optional year filter into exactly one
//! `GET {store_url}/api/updates[?year=YYYY]` request. No retry and no
//! caching; callers that cache must key by [`QueryService::cache_key`] so
//! results for different years are never conflated.

use std::time::Duration;

use async_trait::async_trait;
use patchlog_common::UpdateRecord;
use thiserror::Error;
use tracing::debug;

use crate::http::{build_http_client, join_url, read_error};

/// Read-path failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// Request never produced a response (connect, timeout, ...)
    #[error("Network error: {0}")]
    Transport(String),

    /// Store answered with a non-success status
    #[error("Store returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Body was not a list of update records
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Anything that can produce update records for a year filter
#[async_trait]
pub trait UpdateSource: Send + Sync {
    async fn fetch(&self, year: Option<&str>) -> Result<Vec<UpdateRecord>, FetchError>;
}

/// HTTP client for the record store's query interface
#[derive(Debug, Clone)]
pub struct QueryService {
    http_client: reqwest::Client,
    endpoint: String,
}

impl QueryService {
    pub fn new(store_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let http_client =
            build_http_client(timeout).map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: join_url(store_url, "/api/updates"),
        })
    }

    /// Full URL of the query endpoint
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Cache key for a result of [`Self::fetch_updates`]
    pub fn cache_key(&self, selected_year: Option<&str>) -> (String, Option<String>) {
        (self.endpoint.clone(), selected_year.map(str::to_string))
    }

    /// Fetch records for `selected_year`, or all years when `None`
    ///
    /// Records are returned in the order the store provides.
    pub async fn fetch_updates(
        &self,
        selected_year: Option<&str>,
    ) -> Result<Vec<UpdateRecord>, FetchError> {
        let mut request = self.http_client.get(&self.endpoint);
        if let Some(year) = selected_year {
            request = request.query(&[("year", year)]);
        }

        debug!(year = ?selected_year, "Fetching update records");

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let (_code, message) = read_error(response).await;
            return Err(FetchError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let records: Vec<UpdateRecord> =
            serde_json::from_slice(&body).map_err(|e| FetchError::Parse(e.to_string()))?;

        debug!(year = ?selected_year, count = records.len(), "Fetched update records");

        Ok(records)
    }
}

#[async_trait]
impl UpdateSource for QueryService {
    async fn fetch(&self, year: Option<&str>) -> Result<Vec<UpdateRecord>, FetchError> {
        self.fetch_updates(year).await
    }
}
