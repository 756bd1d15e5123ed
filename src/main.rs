//! pdf-unlock service binary
//!
//! Wires the library together: logging, the unlocker, the artifact reaper,
//! and the REST API server, then waits for a termination signal.

use pdf_unlock::{logging, run_with_shutdown, Config, PdfUnlocker};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();

    // The guard must outlive main or buffered log lines are lost
    let _log_guard = logging::init(&config.logging)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind = %config.server.bind_address,
        work_dir = %config.storage.work_dir.display(),
        "starting pdf-unlock"
    );

    let unlocker = PdfUnlocker::new(config).await?;
    unlocker.start_reaper();

    let server = Arc::new(unlocker.clone());
    let api_handle = server.spawn_api_server();

    run_with_shutdown(unlocker).await?;

    api_handle.abort();
    tracing::info!("pdf-unlock stopped");
    Ok(())
}
