//! System handlers: upload form, health, events, OpenAPI, shutdown.

use crate::api::{ApiDoc, AppState};
use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event as SseEvent, Sse},
        Html, IntoResponse,
    },
    Json,
};
use serde_json::json;
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use utoipa::OpenApi;

/// Minimal upload form served at the root
///
/// Thin UI glue over POST /api/v1/unlock; everything interesting happens in
/// the JSON API.
const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>PDF Unlock</title>
  <style>
    body { font-family: sans-serif; max-width: 600px; margin: 3rem auto; }
    fieldset { border: 1px solid #ccc; border-radius: 6px; padding: 1rem; }
    button { margin-top: 1rem; padding: 0.5rem 1.5rem; }
  </style>
</head>
<body>
  <h1>PDF Unlock</h1>
  <p>Upload one or more PDF files to strip their print/copy/edit restrictions.
     Unlocked files are kept for a limited time, then deleted automatically.</p>
  <form action="/api/v1/unlock" method="post" enctype="multipart/form-data">
    <fieldset>
      <legend>Select PDF files</legend>
      <input type="file" name="files" accept=".pdf" multiple required>
    </fieldset>
    <button type="submit">Unlock</button>
  </form>
  <p>Download results via <code>GET /api/v1/artifacts/&lt;name&gt;</code> or bundle
     them with <code>POST /api/v1/archive</code>.</p>
</body>
</html>
"#;

/// GET / - HTML multi-file upload form
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// GET /api/v1/health - Health check
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "system",
    responses(
        (status = 200, description = "Service is healthy")
    )
)]
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// GET /api/v1/openapi.json - OpenAPI specification
#[utoipa::path(
    get,
    path = "/api/v1/openapi.json",
    tag = "system",
    responses(
        (status = 200, description = "OpenAPI specification document")
    )
)]
pub async fn openapi_spec() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

/// GET /api/v1/events - Server-sent events stream
///
/// Relays the service's broadcast events (per-file outcomes, batch progress,
/// archive builds, reaper actions) to HTTP clients.
#[utoipa::path(
    get,
    path = "/api/v1/events",
    tag = "system",
    responses(
        (status = 200, description = "SSE stream of service events", content_type = "text/event-stream")
    )
)]
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl tokio_stream::Stream<Item = Result<SseEvent, Infallible>>> {
    let receiver = state.unlocker.subscribe();
    let stream = BroadcastStream::new(receiver);

    let sse_stream = stream.filter_map(|result| match result {
        Ok(event) => match serde_json::to_string(&event) {
            Ok(json_data) => {
                let event_type = match &event {
                    crate::types::Event::FileUnlocked { .. } => "file_unlocked",
                    crate::types::Event::FileFailed { .. } => "file_failed",
                    crate::types::Event::BatchProgress { .. } => "batch_progress",
                    crate::types::Event::BatchComplete { .. } => "batch_complete",
                    crate::types::Event::ArchiveCreated { .. } => "archive_created",
                    crate::types::Event::ArchiveFailed { .. } => "archive_failed",
                    crate::types::Event::ArtifactReaped { .. } => "artifact_reaped",
                    crate::types::Event::ReaperError { .. } => "reaper_error",
                };
                Some(Ok(SseEvent::default().event(event_type).data(json_data)))
            }
            Err(_) => None,
        },
        // Lagged subscriber; skip the gap and keep streaming
        Err(_) => None,
    });

    Sse::new(sse_stream)
}

/// POST /api/v1/shutdown - Graceful shutdown
#[utoipa::path(
    post,
    path = "/api/v1/shutdown",
    tag = "system",
    responses(
        (status = 200, description = "Shutdown initiated")
    )
)]
pub async fn shutdown(State(state): State<AppState>) -> impl IntoResponse {
    match state.unlocker.shutdown().await {
        Ok(()) => (StatusCode::OK, Json(json!({"status": "shutting down"}))),
        Err(e) => {
            tracing::error!(error = %e, "shutdown failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": {"code": "internal", "message": "shutdown failed"}})),
            )
        }
    }
}
