//! # Patchlog Common Library
//!
//! Shared code for the patchlog record store and client including:
//! - Update record model (wire and storage shape)
//! - Shared-secret credential handling
//! - API request/response types
//! - Configuration loading
//! - Build identification

pub mod api;
pub mod build_info;
pub mod config;
pub mod error;
pub mod model;

pub use error::{Error, Result};
pub use model::{is_valid_year, NewUpdateRecord, UpdateRecord};
