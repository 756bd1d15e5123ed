//! Artifact listing, download, and archiving handlers.

use super::{ArchiveReport, ArchiveRequest, ArtifactInfo};
use crate::api::AppState;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// GET /api/v1/artifacts - List registered artifacts
#[utoipa::path(
    get,
    path = "/api/v1/artifacts",
    tag = "artifacts",
    responses(
        (status = 200, description = "Currently registered artifacts", body = Vec<ArtifactInfo>)
    )
)]
pub async fn list_artifacts(State(state): State<AppState>) -> impl IntoResponse {
    let mut names: Vec<String> = state
        .unlocker
        .registry()
        .paths()
        .iter()
        .filter_map(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .collect();
    names.sort();

    let infos: Vec<ArtifactInfo> = names.into_iter().map(|name| ArtifactInfo { name }).collect();
    (StatusCode::OK, Json(infos))
}

/// GET /api/v1/artifacts/:name - Download one artifact
///
/// The name is resolved through the artifact registry, so only files the
/// service itself produced are reachable; client-supplied paths never touch
/// the filesystem.
#[utoipa::path(
    get,
    path = "/api/v1/artifacts/{name}",
    tag = "artifacts",
    params(
        ("name" = String, Path, description = "Artifact file name as returned by the unlock or archive endpoints")
    ),
    responses(
        (status = 200, description = "Artifact content", content_type = "application/octet-stream"),
        (status = 404, description = "Artifact not registered or already reaped")
    )
)]
pub async fn download_artifact(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Response {
    let Some(path) = state.unlocker.registry().find_by_name(&name) else {
        return not_found(&name);
    };

    // The reaper may win the race between lookup and read
    let content = match tokio::fs::read(&path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return not_found(&name),
        Err(e) => {
            tracing::error!(artifact = %name, error = %e, "failed to read artifact");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": {"code": "io_error", "message": "failed to read artifact"}})),
            )
                .into_response();
        }
    };

    let content_type = if name.ends_with(".zip") {
        "application/zip"
    } else {
        "application/pdf"
    };

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", name),
            ),
        ],
        content,
    )
        .into_response()
}

/// POST /api/v1/archive - Bundle artifacts into one ZIP archive
#[utoipa::path(
    post,
    path = "/api/v1/archive",
    tag = "artifacts",
    request_body = ArchiveRequest,
    responses(
        (status = 200, description = "Archive created", body = ArchiveReport),
        (status = 400, description = "Nothing to archive"),
        (status = 404, description = "A requested artifact is not registered"),
        (status = 422, description = "Archive construction failed")
    )
)]
pub async fn build_archive(
    State(state): State<AppState>,
    Json(request): Json<ArchiveRequest>,
) -> Response {
    if request.files.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": {"code": "nothing_to_archive", "message": "nothing to archive"}})),
        )
            .into_response();
    }

    let mut paths = Vec::with_capacity(request.files.len());
    for name in &request.files {
        match state.unlocker.registry().find_by_name(name) {
            Some(path) => paths.push(path),
            None => {
                return (
                    StatusCode::NOT_FOUND,
                    Json(json!({"error": {"code": "not_found", "message": format!("artifact not found: {}", name)}})),
                )
                    .into_response();
            }
        }
    }

    // Archive construction is synchronous file I/O
    let unlocker = state.unlocker.clone();
    let outcome = match tokio::task::spawn_blocking(move || unlocker.build_archive(&paths)).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(error = %e, "archive task failed to join");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": {"code": "internal", "message": "archive task failed"}})),
            )
                .into_response();
        }
    };

    match outcome.archive_path {
        Some(path) => {
            let archive = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            (
                StatusCode::OK,
                Json(ArchiveReport {
                    archive,
                    message: outcome.message,
                }),
            )
                .into_response()
        }
        None => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"error": {"code": "archive_failed", "message": outcome.message}})),
        )
            .into_response(),
    }
}

fn not_found(name: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"error": {"code": "not_found", "message": format!("artifact not found: {}", name)}})),
    )
        .into_response()
}
