//! Update record endpoints
//!
//! - `GET /api/updates?year=YYYY` records for one year, or all when omitted
//! - `POST /api/updates/import` atomic batch insert

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, Query, State},
    http::StatusCode,
    Json,
};
use patchlog_common::api::ImportResponse;
use patchlog_common::model::validate_batch;
use patchlog_common::{is_valid_year, NewUpdateRecord, UpdateRecord};
use serde::Deserialize;
use tracing::{info, warn};

use crate::{db, ApiError, AppState};

/// Query parameters for listing records
#[derive(Debug, Deserialize)]
pub struct UpdatesQuery {
    /// Four-digit year; absent means all years
    pub year: Option<String>,
}

/// GET /api/updates
///
/// Returns records in insertion order.
pub async fn list_updates(
    State(state): State<AppState>,
    Query(query): Query<UpdatesQuery>,
) -> Result<Json<Vec<UpdateRecord>>, ApiError> {
    if let Some(year) = query.year.as_deref() {
        if !is_valid_year(year) {
            return Err(ApiError::BadRequest(format!(
                "year must be four digits, got {:?}",
                year
            )));
        }
    }

    let records = db::fetch_updates(&state.db, query.year.as_deref()).await?;
    Ok(Json(records))
}

/// POST /api/updates/import
///
/// Body is a JSON array of update records (without ids). The batch is
/// validated as a whole before anything is written.
pub async fn import_updates(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<ImportResponse>, ApiError> {
    let body = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(rejection.body_text())
        } else {
            ApiError::BadRequest(rejection.body_text())
        }
    })?;

    let records: Vec<NewUpdateRecord> = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid update batch: {}", e)))?;

    validate_batch(&records).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let ids = match db::insert_batch(&state.db, &records).await {
        Ok(ids) => ids,
        Err(e) => {
            warn!(batch_size = records.len(), "Rejected import batch: {}", e);
            return Err(e.into());
        }
    };

    info!(inserted = ids.len(), "Imported update batch");

    Ok(Json(ImportResponse {
        inserted: ids.len(),
        ids,
    }))
}
