use axum::{extract::Extension, http::StatusCode, Json};
use serde::Serialize;
use uuid::Uuid;

use crate::kernel::jobs::JobStore;
use crate::kernel::ServerDeps;

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    job_store: JobStoreHealth,
}

#[derive(Serialize)]
pub struct JobStoreHealth {
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Health check endpoint
///
/// Probes the job store with a read and reports 200 OK when it responds,
/// 503 Service Unavailable otherwise.
pub async fn health_handler(
    Extension(deps): Extension<ServerDeps>,
) -> (StatusCode, Json<HealthResponse>) {
    let store_health = match tokio::time::timeout(
        std::time::Duration::from_secs(5),
        deps.job_store.get(Uuid::nil()),
    )
    .await
    {
        Ok(Ok(_)) => JobStoreHealth {
            status: "ok".to_string(),
            error: None,
        },
        Ok(Err(e)) => JobStoreHealth {
            status: "error".to_string(),
            error: Some(e.to_string()),
        },
        Err(_) => JobStoreHealth {
            status: "error".to_string(),
            error: Some("probe timeout (>5s)".to_string()),
        },
    };

    let is_healthy = store_health.status == "ok";
    let status_code = if is_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(HealthResponse {
            status: if is_healthy { "healthy" } else { "unhealthy" }.to_string(),
            job_store: store_health,
        }),
    )
}
