//! ZIP archive builder
//!
//! Bundles a set of completed artifacts into one downloadable archive. The
//! archive is named with a wall-clock timestamp to avoid collisions, written
//! to the shared work dir, and registered like any other artifact so the
//! reaper reclaims it too. Construction failures are caught here and reported
//! as an outcome — nothing raises to the caller.

use crate::error::ArchiveError;
use crate::registry::ArtifactRegistry;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Name suffix of every archive: `<YYYYMMDD_HHMMSS>_unlocked_pdfs.zip`
const ARCHIVE_SUFFIX: &str = "_unlocked_pdfs.zip";

/// Outcome of one archive build
///
/// `archive_path` is `None` on failure or empty input.
#[derive(Debug, Clone)]
pub struct ArchiveOutcome {
    /// Path of the produced archive, present only on success
    pub archive_path: Option<PathBuf>,
    /// Human-readable success or failure message
    pub message: String,
}

/// Builds ZIP archives over registered artifacts
pub struct ArchiveBuilder {
    registry: ArtifactRegistry,
    work_dir: PathBuf,
}

impl ArchiveBuilder {
    /// Create a builder writing archives into `work_dir`
    pub fn new(registry: ArtifactRegistry, work_dir: PathBuf) -> Self {
        Self { registry, work_dir }
    }

    /// Bundle the given files into one timestamped ZIP archive
    ///
    /// Each input that still exists on disk at build time is added under its
    /// base filename. Identically named inputs collide; the last one written
    /// wins. The archive is registered in the artifact registry on success.
    pub fn build(&self, files: &[PathBuf]) -> ArchiveOutcome {
        if files.is_empty() {
            return ArchiveOutcome {
                archive_path: None,
                message: "nothing to archive".to_string(),
            };
        }

        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let archive_path = self
            .work_dir
            .join(format!("{}{}", timestamp, ARCHIVE_SUFFIX));

        match self.write_zip(&archive_path, files) {
            Ok(entry_count) => {
                self.registry.register(archive_path.clone());
                info!(
                    archive = %archive_path.display(),
                    entries = entry_count,
                    "created archive"
                );
                ArchiveOutcome {
                    message: format!(
                        "created archive {} with {} file(s)",
                        archive_path
                            .file_name()
                            .map(|n| n.to_string_lossy().into_owned())
                            .unwrap_or_default(),
                        entry_count
                    ),
                    archive_path: Some(archive_path),
                }
            }
            Err(e) => {
                error!(archive = %archive_path.display(), error = %e, "archive build failed");
                // Never leave a partial archive behind or registered
                if let Err(remove_err) = std::fs::remove_file(&archive_path) {
                    if remove_err.kind() != std::io::ErrorKind::NotFound {
                        warn!(
                            archive = %archive_path.display(),
                            error = %remove_err,
                            "could not remove partial archive"
                        );
                    }
                }
                ArchiveOutcome {
                    archive_path: None,
                    message: format!("failed to create archive: {}", e),
                }
            }
        }
    }

    /// Write the ZIP container, returning the number of entries added
    fn write_zip(
        &self,
        archive_path: &Path,
        files: &[PathBuf],
    ) -> std::result::Result<usize, ArchiveError> {
        let creation = |e: String| ArchiveError::Creation {
            path: archive_path.to_path_buf(),
            reason: e,
        };

        let file = std::fs::File::create(archive_path).map_err(|e| creation(e.to_string()))?;
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::FileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);

        let mut entry_count = 0;
        for path in files {
            // A racing reaper may have deleted the file since the batch ran
            let content = match std::fs::read(path) {
                Ok(content) => content,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    warn!(file = %path.display(), "skipping archived file that no longer exists");
                    continue;
                }
                Err(e) => return Err(creation(e.to_string())),
            };

            let entry_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "artifact".to_string());

            writer
                .start_file(entry_name, options)
                .map_err(|e| creation(e.to_string()))?;
            writer
                .write_all(&content)
                .map_err(|e| creation(e.to_string()))?;
            entry_count += 1;
        }

        writer.finish().map_err(|e| creation(e.to_string()))?;
        Ok(entry_count)
    }
}
