//! Authentication middleware for the import route
//!
//! The credential travels in the `x-patchlog-secret` header and is checked
//! against the configured shared secret. Missing, non-UTF-8 and wrong values
//! are indistinguishable to the caller.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use patchlog_common::api::SECRET_HEADER;
use tracing::warn;

use crate::{ApiError, AppState};

/// Reject requests whose credential does not match the ingest secret
///
/// **Note:** Applied to the import route only. Reads stay public.
pub async fn require_ingest_secret(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let authorized = request
        .headers()
        .get(SECRET_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|candidate| state.ingest_secret.verify(candidate))
        .unwrap_or(false);

    if !authorized {
        // Never log the supplied value
        warn!(
            path = %request.uri().path(),
            "Rejected request: invalid or missing ingest credential"
        );
        return Err(ApiError::Unauthorized);
    }

    Ok(next.run(request).await)
}
