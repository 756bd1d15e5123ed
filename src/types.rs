//! Core types and events for pdf-unlock

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use utoipa::ToSchema;

/// A single uploaded file, resolved to a local path at the HTTP boundary
///
/// Constructed exactly once per upload before entering the core; the core
/// treats it as read-only input and never mutates or deletes the source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadCandidate {
    /// Local path the upload was spooled to
    pub path: PathBuf,
    /// File name as declared by the client (used for output naming and logs)
    pub declared_name: String,
    /// Size of the spooled file in bytes
    pub size: u64,
}

impl UploadCandidate {
    /// Build a candidate from a spooled file, reading its size from disk
    ///
    /// The declared name falls back to the path's file name when the client
    /// did not provide one.
    pub fn from_path(path: PathBuf, declared_name: Option<String>) -> std::io::Result<Self> {
        let size = std::fs::metadata(&path)?.len();
        let declared_name = declared_name.unwrap_or_else(|| {
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "upload".to_string())
        });
        Ok(Self {
            path,
            declared_name,
            size,
        })
    }

    /// Extension of the declared name, without the leading dot
    pub fn extension(&self) -> Option<String> {
        std::path::Path::new(&self.declared_name)
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
    }
}

/// Outcome of validating one upload candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    /// The candidate is eligible for unlocking
    Accepted,
    /// The candidate was rejected before any work was scheduled
    Rejected {
        /// Stable, human-readable rejection reason
        reason: String,
    },
}

impl ValidationResult {
    /// Whether the candidate passed validation
    pub fn is_accepted(&self) -> bool {
        matches!(self, ValidationResult::Accepted)
    }

    /// The rejection reason, if any
    pub fn reason(&self) -> Option<&str> {
        match self {
            ValidationResult::Accepted => None,
            ValidationResult::Rejected { reason } => Some(reason),
        }
    }
}

/// Outcome of one unlock worker invocation
///
/// Exactly one of these is produced per scheduled candidate; `output_path`
/// is `None` on failure. Failures are data, not raised errors — a failed
/// file never aborts its batch.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UnlockOutcome {
    /// Path of the unlocked artifact, present only on success
    #[schema(value_type = Option<String>)]
    pub output_path: Option<PathBuf>,
    /// Human-readable success or failure message
    pub message: String,
    /// Page count of the processed document (0 when parsing failed)
    pub pages: usize,
}

impl UnlockOutcome {
    /// Whether the worker produced an artifact
    pub fn is_success(&self) -> bool {
        self.output_path.is_some()
    }
}

/// Aggregate result of one batch run
///
/// `outputs` is ordered by task completion, which is non-deterministic across
/// runs with the same input; callers must not assume stable ordering.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BatchResult {
    /// Successful artifact paths in completion order
    #[schema(value_type = Vec<String>)]
    pub outputs: Vec<PathBuf>,
    /// Number of candidates that produced an artifact
    pub succeeded: usize,
    /// Number of candidates that failed validation or unlocking
    pub failed: usize,
}

impl BatchResult {
    /// Qualitative status of the batch
    pub fn status(&self) -> BatchStatus {
        match (self.succeeded, self.failed) {
            (0, 0) => BatchStatus::NothingSelected,
            (0, _) => BatchStatus::AllFailed,
            (_, 0) => BatchStatus::AllSucceeded,
            _ => BatchStatus::Partial,
        }
    }

    /// Short human-readable tally, e.g. "5 succeeded, 2 failed"
    pub fn summary(&self) -> String {
        format!("{} succeeded, {} failed", self.succeeded, self.failed)
    }
}

/// Qualitative batch status surfaced to users after each run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    /// Every submitted file was unlocked
    AllSucceeded,
    /// Some files were unlocked, some failed
    Partial,
    /// No file was unlocked
    AllFailed,
    /// The batch contained no files
    NothingSelected,
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BatchStatus::AllSucceeded => "all succeeded",
            BatchStatus::Partial => "partial",
            BatchStatus::AllFailed => "all failed",
            BatchStatus::NothingSelected => "nothing selected",
        };
        write!(f, "{}", s)
    }
}

/// Events emitted over the broadcast channel
///
/// Consumers subscribe via [`crate::PdfUnlocker::subscribe`]; the SSE endpoint
/// relays these to HTTP clients. Emitting with no subscribers is a no-op.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A file was unlocked successfully
    FileUnlocked {
        /// Declared name of the input file
        name: String,
        /// Path of the unlocked artifact
        #[schema(value_type = String)]
        output: PathBuf,
    },
    /// A file failed validation or unlocking
    FileFailed {
        /// Declared name of the input file
        name: String,
        /// Failure message
        message: String,
    },
    /// Fractional batch progress (completed / total scheduled)
    BatchProgress {
        /// Tasks completed so far
        completed: usize,
        /// Total scheduled tasks
        total: usize,
    },
    /// A batch finished
    BatchComplete {
        /// Number of successful files
        succeeded: usize,
        /// Number of failed files
        failed: usize,
    },
    /// An archive was built
    ArchiveCreated {
        /// Path of the archive
        #[schema(value_type = String)]
        path: PathBuf,
    },
    /// Archive construction failed
    ArchiveFailed {
        /// Failure message
        message: String,
    },
    /// The reaper deleted an expired artifact
    ArtifactReaped {
        /// Path of the deleted artifact
        #[schema(value_type = String)]
        path: PathBuf,
    },
    /// The reaper failed to delete an expired artifact
    ReaperError {
        /// Path of the artifact that could not be deleted
        #[schema(value_type = String)]
        path: PathBuf,
        /// Failure message
        message: String,
    },
}
