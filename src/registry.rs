//! Artifact registry and background reaper
//!
//! Every durable file the service produces (unlocked PDFs, archives) is
//! registered here with its creation instant. The [`Reaper`] is the only
//! mechanism that reclaims disk space: callers never delete their own
//! artifacts. The registry is an injectable handle passed explicitly to
//! workers, the archive builder, and the reaper task rather than a hidden
//! process-wide singleton.

use crate::config::RetentionConfig;
use crate::types::Event;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Directory-name prefix for per-unlock staging directories
///
/// The reaper uses it to recognize staging directories it may remove once
/// their artifact is gone.
pub(crate) const STAGING_PREFIX: &str = "unlock-";

/// Shared table of artifact path → creation instant
///
/// All reads and writes serialize through one mutex; the lock is never held
/// across an await point or during file I/O. The registry may transiently
/// reference a path whose file was already deleted by a racing owner, so
/// deletes must tolerate "already gone".
#[derive(Clone, Default)]
pub struct ArtifactRegistry {
    inner: Arc<Mutex<HashMap<PathBuf, Instant>>>,
}

impl ArtifactRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an artifact that exists on disk right now
    pub fn register(&self, path: PathBuf) {
        let mut map = self.lock();
        map.insert(path, Instant::now());
    }

    /// Whether the given path is currently registered
    pub fn contains(&self, path: &Path) -> bool {
        self.lock().contains_key(path)
    }

    /// Number of registered artifacts
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Snapshot of all registered paths
    pub fn paths(&self) -> Vec<PathBuf> {
        self.lock().keys().cloned().collect()
    }

    /// Look up a registered artifact by its file name
    ///
    /// Download and archive requests address artifacts by name only; resolving
    /// through the registry means no caller-supplied path ever reaches the
    /// filesystem layer.
    pub fn find_by_name(&self, name: &str) -> Option<PathBuf> {
        self.lock()
            .keys()
            .find(|p| p.file_name().is_some_and(|n| n == name))
            .cloned()
    }

    /// Remove and return every entry older than `ttl`
    ///
    /// Entries leave the registry here regardless of whether the subsequent
    /// file deletion succeeds, so the table cannot grow without bound.
    pub fn take_expired(&self, ttl: Duration) -> Vec<PathBuf> {
        let mut map = self.lock();
        let expired: Vec<PathBuf> = map
            .iter()
            .filter(|(_, created)| created.elapsed() > ttl)
            .map(|(path, _)| path.clone())
            .collect();
        for path in &expired {
            map.remove(path);
        }
        expired
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, Instant>> {
        // A poisoned lock means a panic while holding a few map operations;
        // the map itself is still coherent, so keep going.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Background task that deletes expired artifacts
///
/// Wakes on a fixed interval, takes the expired set from the registry under
/// its lock, then deletes the files outside the lock. Runs until the shutdown
/// token is cancelled.
pub struct Reaper {
    registry: ArtifactRegistry,
    ttl: Duration,
    interval: Duration,
    event_tx: broadcast::Sender<Event>,
    shutdown: CancellationToken,
}

impl Reaper {
    /// Create a reaper over the given registry
    pub fn new(
        registry: ArtifactRegistry,
        retention: &RetentionConfig,
        event_tx: broadcast::Sender<Event>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            registry,
            ttl: retention.artifact_ttl(),
            interval: retention.sweep_interval(),
            event_tx,
            shutdown,
        }
    }

    /// Run the sweep loop until shutdown
    pub async fn run(self) {
        info!(
            ttl_secs = self.ttl.as_secs(),
            interval_secs = self.interval.as_secs(),
            "Reaper task started"
        );

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!("Reaper task shutting down");
                    break;
                }
                _ = sleep(self.interval) => {
                    self.sweep();
                }
            }
        }

        info!("Reaper task stopped");
    }

    /// Delete every expired artifact once
    ///
    /// File deletion happens after the entries have left the registry; a file
    /// already removed by a racing cleanup is not an error.
    pub fn sweep(&self) {
        let expired = self.registry.take_expired(self.ttl);
        if expired.is_empty() {
            debug!("reaper sweep found no expired artifacts");
            return;
        }

        for path in expired {
            match std::fs::remove_file(&path) {
                Ok(()) => {
                    info!(path = %path.display(), "reaped expired artifact");
                    self.event_tx.send(Event::ArtifactReaped { path: path.clone() }).ok();
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    debug!(path = %path.display(), "expired artifact already gone");
                }
                Err(e) => {
                    // Entry is already out of the registry; the file may leak
                    // until the permission problem is fixed.
                    error!(path = %path.display(), error = %e, "failed to reap expired artifact");
                    self.event_tx
                        .send(Event::ReaperError {
                            path: path.clone(),
                            message: e.to_string(),
                        })
                        .ok();
                }
            }

            remove_staging_dir(&path);
        }
    }
}

/// Best-effort removal of an artifact's now-empty private staging directory
///
/// Only directories the unlock worker created (recognized by prefix) are
/// touched; `remove_dir` refuses non-empty directories, which covers the
/// shared work dir and any staging dir that still holds files.
fn remove_staging_dir(artifact: &Path) {
    let Some(parent) = artifact.parent() else {
        return;
    };
    let is_staging = parent
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with(STAGING_PREFIX));
    if is_staging {
        if let Err(e) = std::fs::remove_dir(parent) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %parent.display(), error = %e, "could not remove staging directory");
            }
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::time::{timeout, Duration as TokioDuration};

    fn fast_retention() -> RetentionConfig {
        RetentionConfig {
            artifact_ttl_secs: 0,
            sweep_interval_secs: 0,
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = ArtifactRegistry::new();
        assert!(registry.is_empty());

        registry.register(PathBuf::from("/tmp/out/a.pdf"));
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(Path::new("/tmp/out/a.pdf")));
        assert_eq!(
            registry.find_by_name("a.pdf"),
            Some(PathBuf::from("/tmp/out/a.pdf"))
        );
        assert_eq!(registry.find_by_name("b.pdf"), None);
    }

    #[test]
    fn test_take_expired_removes_entries() {
        let registry = ArtifactRegistry::new();
        registry.register(PathBuf::from("/tmp/out/a.pdf"));
        registry.register(PathBuf::from("/tmp/out/b.pdf"));

        // Nothing has aged past a long TTL
        assert!(registry.take_expired(Duration::from_secs(3600)).is_empty());
        assert_eq!(registry.len(), 2);

        // With a zero TTL everything is expired, and taking drains the table
        let mut expired = registry.take_expired(Duration::ZERO);
        expired.sort();
        assert_eq!(
            expired,
            vec![PathBuf::from("/tmp/out/a.pdf"), PathBuf::from("/tmp/out/b.pdf")]
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn test_sweep_deletes_file_and_tolerates_absent() {
        let dir = TempDir::new().unwrap();
        let existing = dir.path().join("keep.pdf");
        std::fs::write(&existing, b"%PDF-1.4").unwrap();
        let ghost = dir.path().join("ghost.pdf");

        let registry = ArtifactRegistry::new();
        registry.register(existing.clone());
        registry.register(ghost.clone());

        let (event_tx, mut event_rx) = broadcast::channel(16);
        let reaper = Reaper::new(
            registry.clone(),
            &fast_retention(),
            event_tx,
            CancellationToken::new(),
        );
        reaper.sweep();

        assert!(!existing.exists());
        assert!(registry.is_empty());

        // Exactly one reap event: the ghost was already gone
        let event = event_rx.try_recv().unwrap();
        assert!(matches!(event, Event::ArtifactReaped { path } if path == existing));
        assert!(event_rx.try_recv().is_err());
    }

    #[test]
    fn test_sweep_removes_empty_staging_dir() {
        let dir = TempDir::new().unwrap();
        let staging = dir.path().join(format!("{}abc", STAGING_PREFIX));
        std::fs::create_dir(&staging).unwrap();
        let artifact = staging.join("doc_unlocked.pdf");
        std::fs::write(&artifact, b"%PDF-1.4").unwrap();

        let registry = ArtifactRegistry::new();
        registry.register(artifact.clone());

        let (event_tx, _rx) = broadcast::channel(16);
        Reaper::new(
            registry,
            &fast_retention(),
            event_tx,
            CancellationToken::new(),
        )
        .sweep();

        assert!(!artifact.exists());
        assert!(!staging.exists());
    }

    #[test]
    fn test_sweep_leaves_shared_dir_alone() {
        // Archives live directly in the shared work dir, which must survive
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("20240101_000000_unlocked_pdfs.zip");
        std::fs::write(&archive, b"PK").unwrap();

        let registry = ArtifactRegistry::new();
        registry.register(archive.clone());

        let (event_tx, _rx) = broadcast::channel(16);
        Reaper::new(
            registry,
            &fast_retention(),
            event_tx,
            CancellationToken::new(),
        )
        .sweep();

        assert!(!archive.exists());
        assert!(dir.path().exists());
    }

    #[tokio::test]
    async fn test_reaper_exits_on_shutdown_signal() {
        let (event_tx, _rx) = broadcast::channel(16);
        let shutdown = CancellationToken::new();
        let retention = RetentionConfig {
            artifact_ttl_secs: 3600,
            sweep_interval_secs: 3600,
        };
        let reaper = Reaper::new(
            ArtifactRegistry::new(),
            &retention,
            event_tx,
            shutdown.clone(),
        );

        let handle = tokio::spawn(reaper.run());
        shutdown.cancel();

        let result = timeout(TokioDuration::from_secs(1), handle).await;
        assert!(result.is_ok(), "Reaper should exit on shutdown signal");
    }

    #[tokio::test]
    async fn test_reaper_sweeps_on_interval() {
        let dir = TempDir::new().unwrap();
        let artifact = dir.path().join("old.pdf");
        std::fs::write(&artifact, b"%PDF-1.4").unwrap();

        let registry = ArtifactRegistry::new();
        registry.register(artifact.clone());

        let (event_tx, _rx) = broadcast::channel(16);
        let shutdown = CancellationToken::new();
        let reaper = Reaper::new(registry.clone(), &fast_retention(), event_tx, shutdown.clone());
        let handle = tokio::spawn(reaper.run());

        // Zero TTL + zero interval: the first sweep should fire immediately
        timeout(TokioDuration::from_secs(2), async {
            while artifact.exists() {
                tokio::time::sleep(TokioDuration::from_millis(10)).await;
            }
        })
        .await
        .expect("artifact should be reaped within the timeout");

        assert!(registry.is_empty());
        shutdown.cancel();
        handle.await.unwrap();
    }
}
