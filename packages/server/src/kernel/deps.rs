//! Shared server dependencies.

use std::sync::Arc;

use super::jobs::{JobEngine, JobStore};

/// Dependency bundle handed to routes via axum `Extension`.
#[derive(Clone)]
pub struct ServerDeps {
    pub job_store: Arc<dyn JobStore>,
    pub engine: JobEngine,
}

impl ServerDeps {
    pub fn new(job_store: Arc<dyn JobStore>, engine: JobEngine) -> Self {
        Self { job_store, engine }
    }
}
