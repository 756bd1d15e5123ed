//! Single-file unlock worker
//!
//! Transforms one uploaded PDF into one unrestricted artifact. Each
//! invocation works in its own freshly created staging directory under the
//! configured work dir; no two invocations ever share one. The PDF rewriting
//! itself is delegated to `lopdf` — this module only drives it and owns the
//! staging-directory lifecycle.
//!
//! Permission restrictions (no-print, no-copy, no-edit flags) live in the
//! document's `Encrypt` dictionary. Restricted-but-readable PDFs carry an
//! owner password with an empty user password, so the worker decrypts with
//! the empty password and drops the `Encrypt` entry. Documents that need a
//! real user password are unsupported and fail per-file.

use crate::error::TransformError;
use crate::registry::{ArtifactRegistry, STAGING_PREFIX};
use crate::types::{UnlockOutcome, UploadCandidate};
use std::path::Path;
use tracing::{error, info};

/// Suffix appended to the input's base name for the unlocked output
const OUTPUT_SUFFIX: &str = "_unlocked";

/// Unlock one candidate, registering the artifact on success
///
/// Synchronous by design: the batch coordinator runs it on the blocking
/// thread pool. On any failure the staging directory is removed best-effort
/// and a failure outcome is returned; nothing is propagated.
pub fn unlock(
    candidate: &UploadCandidate,
    registry: &ArtifactRegistry,
    work_dir: &Path,
) -> UnlockOutcome {
    let staging = match tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempdir_in(work_dir)
    {
        Ok(dir) => dir,
        Err(e) => {
            error!(file = %candidate.declared_name, error = %e, "failed to create staging directory");
            return failure(candidate, &format!("failed to allocate workspace: {}", e), 0);
        }
    };

    let output_path = staging.path().join(output_name(&candidate.declared_name));

    match strip_restrictions(candidate, &output_path) {
        Ok(pages) => {
            // Keep the staging directory; from here on the reaper owns the
            // artifact's lifetime.
            let _staging = staging.keep();
            registry.register(output_path.clone());
            info!(
                file = %candidate.declared_name,
                output = %output_path.display(),
                pages,
                "unlocked file"
            );
            UnlockOutcome {
                output_path: Some(output_path),
                message: format!("unlocked {}", candidate.declared_name),
                pages,
            }
        }
        Err(e) => {
            // Dropping `staging` removes the directory and any partial output;
            // a directory already gone is not an error.
            error!(file = %candidate.declared_name, error = %e, "unlock failed");
            failure(candidate, &e.to_string(), 0)
        }
    }
}

/// Load the document, clear its restrictions, and write the unlocked copy
///
/// Returns the page count on success.
fn strip_restrictions(
    candidate: &UploadCandidate,
    output_path: &Path,
) -> std::result::Result<usize, TransformError> {
    let mut doc =
        lopdf::Document::load(&candidate.path).map_err(|e| TransformError::Malformed {
            path: candidate.path.clone(),
            reason: e.to_string(),
        })?;

    if doc.is_encrypted() {
        // Empty user password covers the common restricted-PDF case; a real
        // user password is explicitly unsupported.
        doc.decrypt("")
            .map_err(|_| TransformError::PasswordProtected {
                path: candidate.path.clone(),
            })?;
    }
    doc.trailer.remove(b"Encrypt");

    let pages = doc.get_pages().len();

    doc.save(output_path)
        .map_err(|e| TransformError::WriteFailed {
            path: candidate.path.clone(),
            reason: e.to_string(),
        })?;

    Ok(pages)
}

fn output_name(declared_name: &str) -> String {
    let base = Path::new(declared_name);
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| declared_name.to_string());
    format!("{}{}.pdf", stem, OUTPUT_SUFFIX)
}

fn failure(candidate: &UploadCandidate, reason: &str, pages: usize) -> UnlockOutcome {
    UnlockOutcome {
        output_path: None,
        message: format!("failed to unlock {}: {}", candidate.declared_name, reason),
        pages,
    }
}
