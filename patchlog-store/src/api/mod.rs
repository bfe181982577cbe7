//! HTTP API handlers for patchlog-store

pub mod auth;
pub mod health;
pub mod updates;

pub use auth::require_ingest_secret;
pub use health::health_routes;
pub use updates::{import_updates, list_updates};
