//! OpenAPI documentation and schema generation
//!
//! Compile-time OpenAPI specification for the pdf-unlock REST API, generated
//! with utoipa. Accessible via `/api/v1/openapi.json` and, when enabled,
//! the interactive `/swagger-ui`.

use utoipa::OpenApi;

/// OpenAPI documentation for the pdf-unlock REST API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "pdf-unlock REST API",
        version = "0.1.0",
        description = "Batch PDF permission-stripping: upload PDFs, download unlocked copies individually or as a ZIP archive",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:7861", description = "Local server")
    ),
    paths(
        // Unlocking
        crate::api::routes::unlock_batch,

        // Artifacts
        crate::api::routes::list_artifacts,
        crate::api::routes::download_artifact,
        crate::api::routes::build_archive,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
        crate::api::routes::event_stream,
        crate::api::routes::shutdown,
    ),
    components(
        schemas(
            crate::api::routes::BatchReport,
            crate::api::routes::ArchiveRequest,
            crate::api::routes::ArchiveReport,
            crate::api::routes::ArtifactInfo,
            crate::types::BatchStatus,
            crate::types::UnlockOutcome,
            crate::types::BatchResult,
            crate::types::Event,
        )
    ),
    tags(
        (name = "unlock", description = "Batch unlocking of uploaded PDFs"),
        (name = "artifacts", description = "Artifact listing, download, and archiving"),
        (name = "system", description = "Health, events, and lifecycle")
    )
)]
pub struct ApiDoc;
