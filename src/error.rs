//! Error types for pdf-unlock
//!
//! This module provides the error taxonomy used throughout the crate:
//! - Per-file transform failures (malformed document, password protection)
//! - Archive construction failures
//! - HTTP status code mapping for API integration
//!
//! Per-file failures are normally carried inside [`crate::types::UnlockOutcome`]
//! rather than propagated; these types cover the boundaries where an error
//! must cross a function seam (archive builds, server startup, shutdown).

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pdf-unlock operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for pdf-unlock
#[derive(Debug, Error)]
pub enum Error {
    /// Upload rejected by validation
    #[error("validation failed: {0}")]
    Validation(String),

    /// PDF transform failed
    #[error("transform error: {0}")]
    Transform(#[from] TransformError),

    /// Archive construction failed
    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Artifact not found in the registry
    #[error("artifact not found: {0}")]
    NotFound(String),

    /// Shutdown in progress - not accepting new batches
    #[error("shutdown in progress: not accepting new batches")]
    ShuttingDown,

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),
}

/// Per-file PDF transform errors
#[derive(Debug, Error)]
pub enum TransformError {
    /// The document could not be parsed as a PDF
    #[error("malformed PDF {path}: {reason}")]
    Malformed {
        /// The input file that failed to parse
        path: PathBuf,
        /// The parser's failure description
        reason: String,
    },

    /// The document requires a user password to open (unsupported)
    #[error("password-protected PDF {path}: user password required")]
    PasswordProtected {
        /// The input file that requires a password
        path: PathBuf,
    },

    /// Writing the unlocked document failed
    #[error("failed to write unlocked output for {path}: {reason}")]
    WriteFailed {
        /// The input file whose output could not be written
        path: PathBuf,
        /// The write failure description
        reason: String,
    },
}

/// Archive construction errors
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// No files were selected for archiving
    #[error("nothing to archive")]
    NothingToArchive,

    /// Creating or writing the archive container failed
    #[error("failed to create archive {path}: {reason}")]
    Creation {
        /// The archive path that could not be produced
        path: PathBuf,
        /// The failure description
        reason: String,
    },
}

/// Map errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// The HTTP status code this error should produce
    fn to_http_status(&self) -> u16;

    /// Machine-readable error code for API clients
    fn error_code(&self) -> &'static str;
}

impl ToHttpStatus for Error {
    fn to_http_status(&self) -> u16 {
        match self {
            Error::Validation(_) => 400,
            Error::Transform(_) => 422,
            Error::Archive(ArchiveError::NothingToArchive) => 400,
            Error::Archive(_) => 422,
            Error::NotFound(_) => 404,
            Error::ShuttingDown => 503,
            Error::Io(_) | Error::Serialization(_) | Error::ApiServerError(_) => 500,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Error::Validation(_) => "validation_failed",
            Error::Transform(_) => "transform_failed",
            Error::Archive(ArchiveError::NothingToArchive) => "nothing_to_archive",
            Error::Archive(_) => "archive_failed",
            Error::NotFound(_) => "not_found",
            Error::ShuttingDown => "shutting_down",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServerError(_) => "api_server_error",
        }
    }
}
