//! Batch unlock handler.

use super::BatchReport;
use crate::api::AppState;
use crate::types::UploadCandidate;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// POST /api/v1/unlock - Upload PDFs and strip their usage restrictions
///
/// Accepts one or more `files` fields in a multipart form. Every part is
/// spooled to disk, validated, and unlocked on the bounded worker pool; the
/// response carries the aggregate outcome and the artifact names to download.
#[utoipa::path(
    post,
    path = "/api/v1/unlock",
    tag = "unlock",
    request_body(content = Vec<u8>, description = "PDF file uploads, repeated 'files' fields (multipart/form-data)", content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Batch processed", body = BatchReport),
        (status = 400, description = "Malformed upload"),
        (status = 503, description = "Shutting down"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn unlock_batch(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    // Per-request spool directory; dropped (and removed) once the batch is
    // done, because unlock outputs live in their own staging directories.
    let spool = match tempfile::Builder::new()
        .prefix("upload-")
        .tempdir_in(state.unlocker.work_dir())
    {
        Ok(dir) => dir,
        Err(e) => {
            tracing::error!(error = %e, "failed to create upload spool directory");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": {"code": "io_error", "message": "could not allocate upload spool"}})),
            )
                .into_response();
        }
    };

    let mut candidates: Vec<UploadCandidate> = Vec::new();
    let mut part_index = 0usize;

    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() != Some("files") {
            continue;
        }

        let declared_name = field.file_name().map(str::to_string);
        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"error": {"code": "invalid_file", "message": format!("failed to read upload: {}", e)}})),
                )
                    .into_response();
            }
        };

        let spooled = spool.path().join(format!("part-{}", part_index));
        part_index += 1;
        if let Err(e) = tokio::fs::write(&spooled, &bytes).await {
            tracing::error!(error = %e, "failed to spool upload");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": {"code": "io_error", "message": "could not spool upload"}})),
            )
                .into_response();
        }

        match UploadCandidate::from_path(spooled, declared_name) {
            Ok(candidate) => candidates.push(candidate),
            Err(e) => {
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": {"code": "io_error", "message": format!("could not stat upload: {}", e)}})),
                )
                    .into_response();
            }
        }
    }

    match state.unlocker.process_batch(candidates).await {
        Ok(result) => {
            let artifacts = result
                .outputs
                .iter()
                .filter_map(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .collect();
            let report = BatchReport {
                status: result.status(),
                message: result.summary(),
                succeeded: result.succeeded,
                failed: result.failed,
                artifacts,
            };
            (StatusCode::OK, Json(report)).into_response()
        }
        Err(crate::Error::ShuttingDown) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"error": {"code": "shutting_down", "message": "not accepting new batches"}})),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "batch processing failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": {"code": "internal", "message": "batch processing failed"}})),
            )
                .into_response()
        }
    }
}
