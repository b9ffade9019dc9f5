//! Shared test harness: in-memory store + mock dependencies wired into a
//! real engine.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use server_core::domains::leads::LeadRecord;
use server_core::kernel::jobs::{EngineConfig, InMemoryJobStore, Job, JobEngine, JobStore};
use server_core::kernel::test_dependencies::{MockAI, MockProfileFetcher};
use server_core::kernel::ServerDeps;
use uuid::Uuid;

pub struct TestHarness {
    pub store: Arc<InMemoryJobStore>,
    pub engine: JobEngine,
    pub fetcher: Arc<MockProfileFetcher>,
    pub ai: Arc<MockAI>,
}

impl TestHarness {
    pub fn deps(&self) -> ServerDeps {
        ServerDeps::new(self.store.clone(), self.engine.clone())
    }
}

pub fn fast_config() -> EngineConfig {
    EngineConfig {
        fetch_concurrency: 4,
        generation_timeout: Duration::from_secs(5),
    }
}

pub fn harness() -> TestHarness {
    harness_with(MockProfileFetcher::new(), MockAI::new(), fast_config())
}

pub fn harness_with(
    fetcher: MockProfileFetcher,
    ai: MockAI,
    config: EngineConfig,
) -> TestHarness {
    let store = Arc::new(InMemoryJobStore::new());
    let fetcher = Arc::new(fetcher);
    let ai = Arc::new(ai);
    let engine = JobEngine::new(store.clone(), fetcher.clone(), ai.clone(), config);
    TestHarness {
        store,
        engine,
        fetcher,
        ai,
    }
}

pub fn lead(first: &str, last: &str, profile_url: Option<&str>) -> LeadRecord {
    LeadRecord {
        first_name: first.to_string(),
        last_name: last.to_string(),
        email: None,
        profile_url: profile_url.map(str::to_string),
        company: Some("Example Corp".to_string()),
        title: None,
        location: None,
    }
}

/// Poll the store until the job reaches a terminal state.
pub async fn wait_for_terminal(store: &InMemoryJobStore, id: Uuid) -> Job {
    for _ in 0..500 {
        if let Some(job) = store.get(id).await.expect("store read failed") {
            if job.status.is_terminal() {
                return job;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {} did not reach a terminal state in time", id);
}

/// Parse an export artifact into rows of cells.
pub fn parse_export(bytes: &[u8]) -> Vec<Vec<String>> {
    csv::Reader::from_reader(bytes)
        .records()
        .map(|r| r.expect("export row").iter().map(str::to_string).collect())
        .collect()
}
