//! API module for shared HTTP API functionality
//!
//! Used by both sides of the wire:
//! - patchlog-store (record store service)
//! - patchlog-client (query service, ingestion gate, CLI)
//!
//! Contains only pure functions and shared types, no HTTP framework code.

pub mod auth;
pub mod types;

pub use auth::{generate_secret, SharedSecret, SECRET_HEADER};
pub use types::{ErrorBody, ErrorResponse, HealthResponse, ImportResponse};
