//! Application state for the API server

use crate::{Config, PdfUnlocker};
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// Cloned per request (cheap Arc clones); provides access to the service
/// instance and configuration.
#[derive(Clone)]
pub struct AppState {
    /// The main PdfUnlocker instance
    pub unlocker: Arc<PdfUnlocker>,

    /// Configuration (read access)
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(unlocker: Arc<PdfUnlocker>, config: Arc<Config>) -> Self {
        Self { unlocker, config }
    }
}
