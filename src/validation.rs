//! Upload validation
//!
//! Rejects ineligible uploads before any unlock work is scheduled. Checks run
//! in a fixed order and short-circuit on the first failure, producing the
//! stable reason strings surfaced to users and logs. Validation has no side
//! effects and never propagates an error: anything unexpected becomes a
//! generic rejection.

use crate::config::LimitsConfig;
use crate::types::{UploadCandidate, ValidationResult};
use tracing::warn;

/// Validate one upload candidate against the configured limits
///
/// Check order:
/// 1. the candidate resolves to an existing file — "invalid file object"
/// 2. extension is in the supported set — "unsupported file type: .<ext>"
/// 3. the file is non-empty — "file is empty"
/// 4. the file is within the size limit — "file size exceeds limit (<N>MB)"
pub fn validate(candidate: &UploadCandidate, limits: &LimitsConfig) -> ValidationResult {
    if candidate.declared_name.is_empty() || !candidate.path.is_file() {
        return reject(candidate, "invalid file object".to_string());
    }

    match candidate.extension() {
        Some(ext) if limits.supports_extension(&ext) => {}
        Some(ext) => {
            return reject(
                candidate,
                format!("unsupported file type: .{}", ext.to_lowercase()),
            );
        }
        None => {
            return reject(candidate, "unsupported file type: (none)".to_string());
        }
    }

    if candidate.size == 0 {
        return reject(candidate, "file is empty".to_string());
    }

    if candidate.size > limits.max_file_size_bytes() {
        return reject(
            candidate,
            format!("file size exceeds limit ({}MB)", limits.max_file_size_mb),
        );
    }

    ValidationResult::Accepted
}

fn reject(candidate: &UploadCandidate, reason: String) -> ValidationResult {
    warn!(
        file = %candidate.declared_name,
        reason = %reason,
        "upload rejected"
    );
    ValidationResult::Rejected { reason }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn candidate_with_content(
        dir: &TempDir,
        declared_name: &str,
        content: &[u8],
    ) -> UploadCandidate {
        let path = dir.path().join("spooled");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content).unwrap();
        UploadCandidate {
            path,
            declared_name: declared_name.to_string(),
            size: content.len() as u64,
        }
    }

    #[test]
    fn test_accepts_small_pdf() {
        let dir = TempDir::new().unwrap();
        let candidate = candidate_with_content(&dir, "doc.pdf", b"%PDF-1.4");
        assert!(validate(&candidate, &LimitsConfig::default()).is_accepted());
    }

    #[test]
    fn test_rejects_missing_file() {
        let candidate = UploadCandidate {
            path: "/nonexistent/spool/file".into(),
            declared_name: "doc.pdf".to_string(),
            size: 10,
        };
        let result = validate(&candidate, &LimitsConfig::default());
        assert_eq!(result.reason(), Some("invalid file object"));
    }

    #[test]
    fn test_rejects_unsupported_extension() {
        let dir = TempDir::new().unwrap();
        let candidate = candidate_with_content(&dir, "notes.TXT", b"hello");
        let result = validate(&candidate, &LimitsConfig::default());
        assert_eq!(result.reason(), Some("unsupported file type: .txt"));
    }

    #[test]
    fn test_rejects_missing_extension() {
        let dir = TempDir::new().unwrap();
        let candidate = candidate_with_content(&dir, "noext", b"hello");
        let result = validate(&candidate, &LimitsConfig::default());
        assert_eq!(result.reason(), Some("unsupported file type: (none)"));
    }

    #[test]
    fn test_rejects_empty_file() {
        let dir = TempDir::new().unwrap();
        let candidate = candidate_with_content(&dir, "empty.pdf", b"");
        let result = validate(&candidate, &LimitsConfig::default());
        assert_eq!(result.reason(), Some("file is empty"));
    }

    #[test]
    fn test_rejects_oversized_file() {
        let dir = TempDir::new().unwrap();
        let limits = LimitsConfig {
            max_file_size_mb: 0,
            ..Default::default()
        };
        let candidate = candidate_with_content(&dir, "big.pdf", b"%PDF-1.4 data");
        let result = validate(&candidate, &limits);
        assert_eq!(result.reason(), Some("file size exceeds limit (0MB)"));
    }

    #[test]
    fn test_extension_check_precedes_size_checks() {
        // An empty file with a bad extension reports the extension problem
        let dir = TempDir::new().unwrap();
        let candidate = candidate_with_content(&dir, "empty.txt", b"");
        let result = validate(&candidate, &LimitsConfig::default());
        assert_eq!(result.reason(), Some("unsupported file type: .txt"));
    }
}
