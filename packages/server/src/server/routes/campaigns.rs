//! Campaign routes: submit a batch, poll status, download the export, and
//! fetch the sample template.

use axum::{
    extract::{Extension, Multipart, Path},
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::domains::leads::{self, SAMPLE_TEMPLATE_CSV};
use crate::kernel::jobs::{JobSnapshot, JobStatus, JobStore, StoreError, SubmitError};
use crate::kernel::ServerDeps;

// =============================================================================
// API error surface
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("job not found")]
    NotFound,

    /// Download requested before the job finished; carries the live progress
    #[error("job is not finished")]
    NotReady(JobSnapshot),

    #[error("job failed: {0}")]
    JobFailed(String),

    #[error("batch contains no records")]
    EmptyBatch,

    #[error("invalid upload: {0}")]
    InvalidUpload(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Internal(err.into())
    }
}

impl From<SubmitError> for ApiError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::EmptyBatch => ApiError::EmptyBatch,
            SubmitError::Store(err) => ApiError::Internal(err.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "job not found" })),
            )
                .into_response(),
            ApiError::NotReady(snapshot) => (
                StatusCode::CONFLICT,
                Json(json!({
                    "error": "job is not finished",
                    "status": snapshot.status,
                    "progress_percent": snapshot.progress_percent,
                    "processed": snapshot.processed,
                    "total": snapshot.total,
                })),
            )
                .into_response(),
            ApiError::JobFailed(message) => (
                StatusCode::CONFLICT,
                Json(json!({ "error": "job failed", "detail": message })),
            )
                .into_response(),
            ApiError::EmptyBatch => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "error": "batch contains no records" })),
            )
                .into_response(),
            ApiError::InvalidUpload(detail) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "error": "invalid upload", "detail": detail })),
            )
                .into_response(),
            ApiError::Internal(err) => {
                tracing::error!(error = %err, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "internal error" })),
                )
                    .into_response()
            }
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

#[derive(Serialize)]
pub struct SubmitResponse {
    pub job_id: Uuid,
}

/// Accept a multipart CSV upload and start a personalization job.
pub async fn submit_handler(
    Extension(deps): Extension<ServerDeps>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    let mut upload: Option<Vec<u8>> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidUpload(e.to_string()))?
    {
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::InvalidUpload(e.to_string()))?;
        upload = Some(bytes.to_vec());
        break;
    }

    let bytes = upload.ok_or_else(|| ApiError::InvalidUpload("no file in upload".to_string()))?;
    let records = leads::parse_batch(&bytes).map_err(|e| ApiError::InvalidUpload(e.to_string()))?;

    let job_id = deps.engine.create(records).await?;
    Ok((StatusCode::ACCEPTED, Json(SubmitResponse { job_id })))
}

/// Poll a job's progress.
pub async fn status_handler(
    Extension(deps): Extension<ServerDeps>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobSnapshot>, ApiError> {
    let snapshot = deps.engine.snapshot(job_id).await?;
    snapshot.map(Json).ok_or(ApiError::NotFound)
}

/// Download the assembled export. Refuses anything but a completed job.
pub async fn download_handler(
    Extension(deps): Extension<ServerDeps>,
    Path(job_id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let job = deps
        .job_store
        .get(job_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    match job.status {
        JobStatus::Completed => {
            let artifact = job
                .artifact
                .clone()
                .ok_or_else(|| anyhow::anyhow!("completed job {} has no artifact", job.id))?;

            let headers = [
                (header::CONTENT_TYPE, "text/csv".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"personalized-leads-{}.csv\"", job.id),
                ),
                (
                    HeaderName::from_static("x-success-count"),
                    job.success_count().to_string(),
                ),
                (
                    HeaderName::from_static("x-error-count"),
                    job.error_count().to_string(),
                ),
            ];
            Ok((headers, artifact).into_response())
        }
        JobStatus::Failed => Err(ApiError::JobFailed(
            job.error.clone().unwrap_or_else(|| "unknown error".to_string()),
        )),
        JobStatus::Queued | JobStatus::Processing => Err(ApiError::NotReady(job.snapshot())),
    }
}

/// Static sample of the expected upload schema.
pub async fn template_handler() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"leads-template.csv\"".to_string(),
            ),
        ],
        SAMPLE_TEMPLATE_CSV,
    )
}
