//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`unlock`] — Batch unlocking of uploaded files
//! - [`artifacts`] — Artifact listing, download, and archiving
//! - [`system`] — Upload form, health, events, OpenAPI, shutdown

use crate::types::BatchStatus;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

mod artifacts;
mod system;
mod unlock;

// Re-export all handlers so `routes::function_name` works at router setup
pub use artifacts::*;
pub use system::*;
pub use unlock::*;

// ============================================================================
// Request/Response Types (shared across handlers)
// ============================================================================

/// Response body of POST /api/v1/unlock
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BatchReport {
    /// Qualitative batch outcome
    pub status: BatchStatus,
    /// Human-readable tally, e.g. "5 succeeded, 2 failed"
    pub message: String,
    /// Number of files unlocked
    pub succeeded: usize,
    /// Number of files that failed validation or unlocking
    pub failed: usize,
    /// File names of the unlocked artifacts, in completion order;
    /// download each via GET /api/v1/artifacts/{name}
    pub artifacts: Vec<String>,
}

/// Request body of POST /api/v1/archive
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ArchiveRequest {
    /// Artifact file names (as returned by POST /api/v1/unlock) to bundle
    pub files: Vec<String>,
}

/// Response body of POST /api/v1/archive
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ArchiveReport {
    /// File name of the created archive
    pub archive: String,
    /// Human-readable status message
    pub message: String,
}

/// One entry of GET /api/v1/artifacts
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ArtifactInfo {
    /// Registered file name, usable with the download and archive endpoints
    pub name: String,
}
