//! # pdf-unlock
//!
//! Backend library and REST service for stripping usage restrictions from
//! PDF files: uploads come in as a batch, each eligible file is rewritten
//! without its permission flags, and the unlocked copies can be downloaded
//! individually or bundled into a ZIP archive. Artifacts are kept in
//! temporary storage and deleted by a background reaper once their TTL
//! expires.
//!
//! ## Design Philosophy
//!
//! pdf-unlock is designed to be:
//! - **Sensible defaults** - Works out of the box with zero configuration
//! - **Library-first** - The HTTP layer is a thin wrapper over [`PdfUnlocker`]
//! - **Batch-tolerant** - A failed file never aborts the rest of its batch
//! - **Event-driven** - Consumers subscribe to events, no polling required
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdf_unlock::{Config, PdfUnlocker, UploadCandidate};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let unlocker = PdfUnlocker::new(Config::default()).await?;
//!     unlocker.start_reaper();
//!
//!     // Subscribe to events
//!     let mut events = unlocker.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let candidate =
//!         UploadCandidate::from_path("report.pdf".into(), Some("report.pdf".to_string()))?;
//!     let result = unlocker.process_batch(vec![candidate]).await?;
//!     println!("{}", result.summary());
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// ZIP archive construction
pub mod archive;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Logging initialization
pub mod logging;
/// Artifact registry and TTL reaper
pub mod registry;
/// Core types and events
pub mod types;
/// Per-file PDF restriction stripping
pub mod unlock;
/// Batch coordinator
pub mod unlocker;
/// Upload validation
pub mod validation;

// Re-export commonly used types
pub use archive::{ArchiveBuilder, ArchiveOutcome};
pub use config::{ApiConfig, Config, LimitsConfig, LoggingConfig, RetentionConfig, StorageConfig};
pub use error::{ArchiveError, Error, Result, ToHttpStatus, TransformError};
pub use registry::{ArtifactRegistry, Reaper};
pub use types::{
    BatchResult, BatchStatus, Event, UnlockOutcome, UploadCandidate, ValidationResult,
};
pub use unlocker::PdfUnlocker;

/// Helper function to run the unlocker with graceful signal handling.
///
/// Waits for a termination signal and then calls the unlocker's `shutdown()` method.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use pdf_unlock::{Config, PdfUnlocker, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let unlocker = PdfUnlocker::new(Config::default()).await?;
///     unlocker.start_reaper();
///
///     // Run with automatic signal handling
///     run_with_shutdown(unlocker).await?;
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(unlocker: PdfUnlocker) -> Result<()> {
    wait_for_signal().await;
    unlocker.shutdown().await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    // Set up signal handlers - these may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
