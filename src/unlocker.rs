//! Core service object
//!
//! [`PdfUnlocker`] owns everything the request handlers and background tasks
//! share: the configuration, the artifact registry, the event broadcast
//! channel, the concurrency semaphore, and the shutdown token. It is cheap to
//! clone (all fields are handles) and is passed explicitly wherever shared
//! state is needed.

use crate::archive::{ArchiveBuilder, ArchiveOutcome};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::registry::{ArtifactRegistry, Reaper};
use crate::types::{BatchResult, Event, UnlockOutcome, UploadCandidate};
use crate::validation;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Worker signature the batch coordinator dispatches to
///
/// Production batches use [`crate::unlock::unlock`]; tests inject probes.
pub(crate) type WorkerFn =
    dyn Fn(&UploadCandidate, &ArtifactRegistry, &Path) -> UnlockOutcome + Send + Sync;

/// Main service instance (cloneable - all fields are handles)
#[derive(Clone)]
pub struct PdfUnlocker {
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Process-wide artifact table, shared with the reaper
    pub(crate) registry: ArtifactRegistry,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: broadcast::Sender<Event>,
    /// Semaphore bounding concurrent unlock tasks (hard cap)
    pub(crate) concurrent_limit: Arc<Semaphore>,
    /// Flag cleared when shutdown begins; new batches are rejected after
    pub(crate) accepting_new: Arc<AtomicBool>,
    /// Token cancelling the reaper and other background tasks
    pub(crate) shutdown_token: CancellationToken,
}

impl PdfUnlocker {
    /// Create a new service instance
    ///
    /// Ensures the work directory exists and sets up the event channel and
    /// concurrency limiter from the configuration.
    pub async fn new(config: Config) -> Result<Self> {
        tokio::fs::create_dir_all(&config.storage.work_dir)
            .await
            .map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "failed to create work directory '{}': {}",
                        config.storage.work_dir.display(),
                        e
                    ),
                ))
            })?;

        // Buffer size of 256 events; slow subscribers lag rather than block
        let (event_tx, _rx) = broadcast::channel(256);

        let concurrent_limit = Arc::new(Semaphore::new(config.limits.max_concurrent_tasks));

        Ok(Self {
            config: Arc::new(config),
            registry: ArtifactRegistry::new(),
            event_tx,
            concurrent_limit,
            accepting_new: Arc::new(AtomicBool::new(true)),
            shutdown_token: CancellationToken::new(),
        })
    }

    /// Subscribe to service events
    ///
    /// Multiple subscribers are supported; each receives all events
    /// independently.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// The shared artifact registry handle
    pub fn registry(&self) -> &ArtifactRegistry {
        &self.registry
    }

    /// The current configuration
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// The shared work directory for staging and archives
    pub fn work_dir(&self) -> &Path {
        &self.config.storage.work_dir
    }

    /// Emit an event to all subscribers
    ///
    /// send() returns Err when there are no receivers, which is fine - the
    /// event is simply dropped.
    pub(crate) fn emit_event(&self, event: Event) {
        self.event_tx.send(event).ok();
    }

    /// Validate and unlock a batch of upload candidates
    ///
    /// Candidates failing validation count as failures and are never
    /// scheduled. Accepted candidates run on the blocking pool, gated by the
    /// concurrency semaphore; results are collected in completion order. A
    /// worker failure or panic counts as one failure and never aborts sibling
    /// tasks. The call blocks until every scheduled task has completed.
    pub async fn process_batch(&self, candidates: Vec<UploadCandidate>) -> Result<BatchResult> {
        let worker: Arc<WorkerFn> = Arc::new(crate::unlock::unlock);
        self.process_batch_with(candidates, worker).await
    }

    pub(crate) async fn process_batch_with(
        &self,
        candidates: Vec<UploadCandidate>,
        worker: Arc<WorkerFn>,
    ) -> Result<BatchResult> {
        if !self.accepting_new.load(Ordering::SeqCst) {
            return Err(Error::ShuttingDown);
        }

        let mut failed = 0;
        let mut accepted = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            match validation::validate(&candidate, &self.config.limits) {
                r if r.is_accepted() => accepted.push(candidate),
                r => {
                    failed += 1;
                    self.emit_event(Event::FileFailed {
                        name: candidate.declared_name.clone(),
                        message: r.reason().unwrap_or("rejected").to_string(),
                    });
                }
            }
        }

        let total = accepted.len();
        let mut tasks: JoinSet<(String, UnlockOutcome)> = JoinSet::new();

        for candidate in accepted {
            let worker = Arc::clone(&worker);
            let registry = self.registry.clone();
            let work_dir = self.config.storage.work_dir.clone();
            let semaphore = Arc::clone(&self.concurrent_limit);
            let name = candidate.declared_name.clone();

            tasks.spawn(async move {
                // Blocks here when the pool is saturated; the permit is the
                // hard concurrency cap
                let permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return (
                            name.clone(),
                            UnlockOutcome {
                                output_path: None,
                                message: format!("failed to unlock {}: shutting down", name),
                                pages: 0,
                            },
                        );
                    }
                };

                let task_name = name.clone();
                let result = tokio::task::spawn_blocking(move || {
                    let _permit = permit;
                    worker(&candidate, &registry, &work_dir)
                })
                .await;

                let outcome = result.unwrap_or_else(|e| UnlockOutcome {
                    output_path: None,
                    message: format!("failed to unlock {}: worker panicked: {}", task_name, e),
                    pages: 0,
                });
                (name, outcome)
            });
        }

        let mut outputs = Vec::with_capacity(total);
        let mut succeeded = 0;
        let mut completed = 0;

        while let Some(joined) = tasks.join_next().await {
            completed += 1;
            match joined {
                Ok((name, outcome)) => match outcome.output_path {
                    Some(path) => {
                        succeeded += 1;
                        self.emit_event(Event::FileUnlocked {
                            name,
                            output: path.clone(),
                        });
                        outputs.push(path);
                    }
                    None => {
                        failed += 1;
                        self.emit_event(Event::FileFailed {
                            name,
                            message: outcome.message,
                        });
                    }
                },
                Err(e) => {
                    // The coordinating task itself died; count it and move on
                    failed += 1;
                    error!(error = %e, "batch task failed to join");
                }
            }
            self.emit_event(Event::BatchProgress { completed, total });
        }

        info!(succeeded, failed, "batch complete");
        self.emit_event(Event::BatchComplete { succeeded, failed });

        Ok(BatchResult {
            outputs,
            succeeded,
            failed,
        })
    }

    /// Bundle previously unlocked artifacts into one ZIP archive
    pub fn build_archive(&self, files: &[PathBuf]) -> ArchiveOutcome {
        let builder = ArchiveBuilder::new(
            self.registry.clone(),
            self.config.storage.work_dir.clone(),
        );
        let outcome = builder.build(files);
        match &outcome.archive_path {
            Some(path) => self.emit_event(Event::ArchiveCreated { path: path.clone() }),
            None => self.emit_event(Event::ArchiveFailed {
                message: outcome.message.clone(),
            }),
        }
        outcome
    }

    /// Start the artifact reaper background task
    ///
    /// The task runs until [`shutdown`](Self::shutdown) cancels it.
    pub fn start_reaper(&self) -> tokio::task::JoinHandle<()> {
        let reaper = Reaper::new(
            self.registry.clone(),
            &self.config.retention,
            self.event_tx.clone(),
            self.shutdown_token.clone(),
        );
        let handle = tokio::spawn(reaper.run());
        info!("Reaper background task started");
        handle
    }

    /// Begin graceful shutdown
    ///
    /// Stops accepting new batches and cancels the reaper and any other task
    /// bound to the shutdown token. In-flight batch calls run to completion.
    pub async fn shutdown(&self) -> Result<()> {
        info!("Shutdown requested");
        self.accepting_new.store(false, Ordering::SeqCst);
        self.shutdown_token.cancel();
        Ok(())
    }

    /// Spawn the REST API server in a background task
    pub fn spawn_api_server(self: &Arc<Self>) -> tokio::task::JoinHandle<Result<()>> {
        let unlocker = self.clone();
        let config = self.config.clone();
        tokio::spawn(async move { crate::api::start_api_server(unlocker, config).await })
    }
}
