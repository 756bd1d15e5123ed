//! Logging initialization
//!
//! Sets up tracing with two outputs: a human-readable console layer filtered
//! by `RUST_LOG`, and a non-blocking daily-rolling file in the configured
//! log directory.

use crate::config::LoggingConfig;
use crate::error::{Error, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the global tracing subscriber
///
/// Returns a guard that must be kept alive for the lifetime of the process;
/// dropping it stops the background writer and loses buffered log lines.
pub fn init(config: &LoggingConfig) -> Result<WorkerGuard> {
    std::fs::create_dir_all(&config.log_dir).map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("failed to create log directory {:?}: {}", config.log_dir, e),
        ))
    })?;

    let file_appender = tracing_appender::rolling::daily(&config.log_dir, &config.log_file_name);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer())
        .with(fmt::layer().with_writer(file_writer).with_ansi(false))
        .init();

    Ok(guard)
}
