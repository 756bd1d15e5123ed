//! Configuration types for pdf-unlock

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use utoipa::ToSchema;

/// Upload and concurrency limits
///
/// Groups the per-file eligibility limits used by the validator and the
/// batch-wide concurrency cap. Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct LimitsConfig {
    /// Maximum accepted upload size in megabytes (default: 100)
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,

    /// Maximum number of unlock tasks running at once (default: 10)
    ///
    /// This is a hard cap: excess batch items queue on the semaphore and
    /// never exceed this bound regardless of batch size.
    #[serde(default = "default_max_concurrent_tasks")]
    pub max_concurrent_tasks: usize,

    /// Accepted file extensions, compared case-insensitively (default: ["pdf"])
    #[serde(default = "default_supported_extensions")]
    pub supported_extensions: Vec<String>,
}

impl LimitsConfig {
    /// Maximum accepted upload size in bytes
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb * 1024 * 1024
    }

    /// Whether the given extension (without the leading dot) is accepted
    pub fn supports_extension(&self, ext: &str) -> bool {
        let ext = ext.to_lowercase();
        self.supported_extensions
            .iter()
            .any(|s| s.trim_start_matches('.').eq_ignore_ascii_case(&ext))
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: default_max_file_size_mb(),
            max_concurrent_tasks: default_max_concurrent_tasks(),
            supported_extensions: default_supported_extensions(),
        }
    }
}

/// Artifact retention policy
///
/// Controls how long unlocked files and archives stay on disk before the
/// background reaper deletes them.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct RetentionConfig {
    /// Seconds an artifact is kept before it becomes eligible for reaping (default: 3600)
    #[serde(default = "default_artifact_ttl_secs")]
    pub artifact_ttl_secs: u64,

    /// Seconds between reaper sweeps (default: 300)
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl RetentionConfig {
    /// Artifact time-to-live as a [`Duration`]
    pub fn artifact_ttl(&self) -> Duration {
        Duration::from_secs(self.artifact_ttl_secs)
    }

    /// Sweep interval as a [`Duration`]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            artifact_ttl_secs: default_artifact_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

/// Working storage configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct StorageConfig {
    /// Root directory for upload spools, per-unlock staging directories, and
    /// archives (default: `<OS temp dir>/pdf-unlock`)
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            work_dir: default_work_dir(),
        }
    }
}

/// HTTP API configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address the API server binds to (default: 127.0.0.1:7861)
    #[serde(default = "default_bind_address")]
    #[schema(value_type = String)]
    pub bind_address: SocketAddr,

    /// Enable CORS middleware (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins; "*" or empty allows any origin (default: empty)
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Serve interactive Swagger UI at /swagger-ui (default: false)
    #[serde(default)]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: Vec::new(),
            swagger_ui: false,
        }
    }
}

/// Logging configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct LoggingConfig {
    /// Directory for the rolling log file (default: "./logs")
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    /// Base name of the rolling log file (default: "pdf-unlock.log")
    #[serde(default = "default_log_file_name")]
    pub log_file_name: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            log_file_name: default_log_file_name(),
        }
    }
}

/// Main configuration for the pdf-unlock service
///
/// All fields carry serde defaults, so `Config::default()` (or an empty
/// config document) yields a working setup: 100 MB per-file limit, 10
/// concurrent unlock tasks, one-hour artifact TTL swept every five minutes,
/// API on 127.0.0.1:7861.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Upload and concurrency limits
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Artifact retention policy
    #[serde(default)]
    pub retention: RetentionConfig,

    /// Working storage locations
    #[serde(default)]
    pub storage: StorageConfig,

    /// HTTP API settings
    #[serde(default)]
    pub server: ApiConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_max_file_size_mb() -> u64 {
    100
}

fn default_max_concurrent_tasks() -> usize {
    10
}

fn default_supported_extensions() -> Vec<String> {
    vec!["pdf".to_string()]
}

fn default_artifact_ttl_secs() -> u64 {
    3600
}

fn default_sweep_interval_secs() -> u64 {
    300
}

fn default_work_dir() -> PathBuf {
    std::env::temp_dir().join("pdf-unlock")
}

fn default_bind_address() -> SocketAddr {
    // Safe to unwrap: literal always parses
    #[allow(clippy::unwrap_used)]
    "127.0.0.1:7861".parse().unwrap()
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("./logs")
}

fn default_log_file_name() -> String {
    "pdf-unlock.log".to_string()
}

fn default_true() -> bool {
    true
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.limits.max_file_size_mb, 100);
        assert_eq!(config.limits.max_concurrent_tasks, 10);
        assert_eq!(config.limits.supported_extensions, vec!["pdf"]);
        assert_eq!(config.retention.artifact_ttl_secs, 3600);
        assert_eq!(config.retention.sweep_interval_secs, 300);
        assert_eq!(config.server.bind_address.port(), 7861);
    }

    #[test]
    fn test_empty_document_deserializes_with_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.limits.max_concurrent_tasks, 10);
        assert_eq!(config.retention.artifact_ttl(), Duration::from_secs(3600));
    }

    #[test]
    fn test_extension_match_is_case_insensitive() {
        let limits = LimitsConfig::default();
        assert!(limits.supports_extension("pdf"));
        assert!(limits.supports_extension("PDF"));
        assert!(!limits.supports_extension("docx"));
    }

    #[test]
    fn test_extension_config_tolerates_leading_dot() {
        let limits = LimitsConfig {
            supported_extensions: vec![".pdf".to_string()],
            ..Default::default()
        };
        assert!(limits.supports_extension("pdf"));
    }

    #[test]
    fn test_max_file_size_bytes() {
        let limits = LimitsConfig {
            max_file_size_mb: 2,
            ..Default::default()
        };
        assert_eq!(limits.max_file_size_bytes(), 2 * 1024 * 1024);
    }
}
