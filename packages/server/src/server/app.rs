//! Application setup and server configuration.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    extract::Extension,
    http::{header::CONTENT_TYPE, Method},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use profile_client::ProfileClient;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::kernel::jobs::{
    EngineConfig, InMemoryJobStore, JobEngine, JobStore, PostgresJobStore,
};
use crate::kernel::{OpenAIAdapter, ServerDeps};
use crate::server::routes::{
    download_handler, health_handler, status_handler, submit_handler, template_handler,
};

/// How often the eviction sweep looks for expired jobs.
const EVICTION_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Build the shared dependencies: job store (Postgres when configured,
/// in-memory otherwise), engine, and the background eviction sweep.
pub async fn build_state(config: &Config) -> Result<ServerDeps> {
    let job_store: Arc<dyn JobStore> = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(url)
                .await
                .context("Failed to connect to database")?;
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("Failed to run migrations")?;
            tracing::info!("using Postgres job store");
            Arc::new(PostgresJobStore::new(pool))
        }
        None => {
            tracing::info!("DATABASE_URL not set, using in-memory job store");
            Arc::new(InMemoryJobStore::new())
        }
    };

    let fetcher = Arc::new(ProfileClient::new());
    let ai = Arc::new(OpenAIAdapter::new(
        config.openai_api_key.clone(),
        config.openai_model.clone(),
    ));

    let engine = JobEngine::new(
        job_store.clone(),
        fetcher,
        ai,
        EngineConfig {
            fetch_concurrency: config.fetch_concurrency,
            generation_timeout: Duration::from_secs(config.generation_timeout_secs),
        },
    );

    spawn_eviction_sweep(job_store.clone(), config.job_ttl_hours);

    Ok(ServerDeps::new(job_store, engine))
}

/// Build the Axum application router
pub fn build_app(deps: ServerDeps) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .route("/api/campaigns", post(submit_handler))
        .route("/api/campaigns/template", get(template_handler))
        .route("/api/campaigns/:id/status", get(status_handler))
        .route("/api/campaigns/:id/download", get(download_handler))
        .route("/health", get(health_handler))
        .layer(Extension(deps))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Periodically drop finished jobs older than the retention window.
fn spawn_eviction_sweep(store: Arc<dyn JobStore>, ttl_hours: u64) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(EVICTION_SWEEP_INTERVAL);
        ticker.tick().await; // skip the immediate first tick

        loop {
            ticker.tick().await;
            let cutoff = Utc::now() - chrono::Duration::hours(ttl_hours as i64);
            match store.evict_finished(cutoff).await {
                Ok(0) => {}
                Ok(evicted) => tracing::info!(evicted, "evicted finished jobs"),
                Err(e) => tracing::warn!(error = %e, "job eviction sweep failed"),
            }
        }
    });
}
