//! Shared API request/response types
//!
//! Bodies exchanged between patchlog-store and patchlog-client.

use serde::{Deserialize, Serialize};

// ========================================
// Success Responses
// ========================================

/// Response to a successful batch import
///
/// `ids` are the store-assigned identifiers, in batch order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ImportResponse {
    pub inserted: usize,
    pub ids: Vec<i64>,
}

/// Health check response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
}

// ========================================
// Error Response Types
// ========================================

/// Error envelope: `{"error": {"code": "...", "message": "..."}}`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Machine-readable code plus human-readable message
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
        }
    }
}
