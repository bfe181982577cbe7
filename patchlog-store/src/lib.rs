//! patchlog-store library - Record Store service
//!
//! Holds update records in SQLite and serves them over HTTP:
//! - `GET /api/updates[?year=YYYY]` query by year (public)
//! - `POST /api/updates/import` atomic batch insert (shared-secret protected)
//! - `GET /health` (public)

use axum::extract::DefaultBodyLimit;
use axum::Router;
use patchlog_common::api::SharedSecret;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod db;
pub mod error;

pub use error::ApiError;

/// Largest accepted request body (10 MiB)
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Shared secret guarding the import route
    pub ingest_secret: SharedSecret,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, ingest_secret: SharedSecret) -> Self {
        Self { db, ingest_secret }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post};

    // Protected routes (require the ingest secret)
    let protected = Router::new()
        .route("/api/updates/import", post(api::import_updates))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::require_ingest_secret,
        ));

    // Public routes (no authentication)
    let public = Router::new()
        .route("/api/updates", get(api::list_updates))
        .merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
