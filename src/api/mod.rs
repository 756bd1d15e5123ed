//! REST API server module
//!
//! Serves the upload form and an OpenAPI-documented JSON API for running
//! unlock batches, building archives, and downloading artifacts.

use crate::{Config, PdfUnlocker, Result};
use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Create the API router with all route definitions
///
/// # Routes
///
/// ## Unlocking
/// - `GET /` - HTML multi-file upload form
/// - `POST /api/v1/unlock` - Run an unlock batch over uploaded files
///
/// ## Artifacts
/// - `GET /api/v1/artifacts` - List registered artifacts
/// - `GET /api/v1/artifacts/:name` - Download one artifact
/// - `POST /api/v1/archive` - Bundle artifacts into a ZIP archive
///
/// ## System
/// - `GET /api/v1/health` - Health check
/// - `GET /api/v1/openapi.json` - OpenAPI specification
/// - `GET /swagger-ui` - Interactive documentation (if enabled)
/// - `GET /api/v1/events` - Server-sent events stream
/// - `POST /api/v1/shutdown` - Graceful shutdown
pub fn create_router(unlocker: Arc<PdfUnlocker>, config: Arc<Config>) -> Router {
    let state = AppState::new(unlocker, config.clone());

    // Batch uploads carry multiple files, so the body limit is a multiple of
    // the per-file limit; per-file enforcement happens in validation.
    let body_limit = (config.limits.max_file_size_bytes() as usize).saturating_mul(10);

    let router = Router::new()
        // Upload form
        .route("/", get(routes::index))
        // Unlocking
        .route("/api/v1/unlock", post(routes::unlock_batch))
        // Artifacts
        .route("/api/v1/artifacts", get(routes::list_artifacts))
        .route("/api/v1/artifacts/:name", get(routes::download_artifact))
        .route("/api/v1/archive", post(routes::build_archive))
        // System
        .route("/api/v1/health", get(routes::health_check))
        .route("/api/v1/openapi.json", get(routes::openapi_spec))
        .route("/api/v1/events", get(routes::event_stream))
        .route("/api/v1/shutdown", post(routes::shutdown));

    // Merge Swagger UI routes if enabled in config (before applying state)
    let router = if config.server.swagger_ui {
        router.merge(SwaggerUi::new("/swagger-ui").url("/api/v1/openapi.json", ApiDoc::openapi()))
    } else {
        router
    };

    let router = router
        .with_state(state)
        .layer(axum::extract::DefaultBodyLimit::max(body_limit));

    // Apply CORS middleware if enabled in config
    if config.server.cors_enabled {
        let cors = build_cors_layer(&config.server.cors_origins);
        router.layer(cors)
    } else {
        router
    }
}

/// Build a CORS layer based on configured origins
///
/// "*" or an empty list allows any origin (the default for local use).
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Start the API server on the configured bind address
///
/// Binds a TCP listener and serves the router until the process shuts down.
pub async fn start_api_server(unlocker: Arc<PdfUnlocker>, config: Arc<Config>) -> Result<()> {
    let bind_address = config.server.bind_address;

    tracing::info!(address = %bind_address, "Starting API server");

    let app = create_router(unlocker, config);

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    tracing::info!(address = %bind_address, "API server listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}
