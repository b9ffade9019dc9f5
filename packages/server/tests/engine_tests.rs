//! Engine integration tests: full pipeline runs over mock dependencies.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{fast_config, harness, harness_with, lead, parse_export, wait_for_terminal};
use profile_client::FetchStatus;
use server_core::kernel::jobs::{
    EngineConfig, InMemoryJobStore, Job, JobEngine, JobStatus, JobStore, Mutator, StoreError,
    SubmitError,
};
use server_core::kernel::test_dependencies::{MockAI, MockProfileFetcher};
use uuid::Uuid;

// =============================================================================
// Scenario tests
// =============================================================================

#[tokio::test]
async fn three_valid_records_complete_with_no_errors() {
    let h = harness();
    let records = vec![
        lead("Jane", "Doe", Some("https://example.com/in/jane")),
        lead("John", "Smith", Some("https://example.com/in/john")),
        lead("Ada", "Lovelace", Some("https://example.com/in/ada")),
    ];

    let job_id = h.engine.create(records).await.unwrap();
    let job = wait_for_terminal(&h.store, job_id).await;

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.processed, 3);
    assert_eq!(job.error_count(), 0);
    assert!(job.completed_at.is_some());

    let rows = parse_export(job.artifact.as_deref().unwrap());
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0][0], "Jane Doe");
    assert_eq!(rows[2][0], "Ada Lovelace");

    let snapshot = job.snapshot();
    assert_eq!(snapshot.progress_percent, 100);
    assert_eq!(snapshot.estimated_remaining_seconds, 0);
}

#[tokio::test]
async fn validation_failure_is_recorded_and_job_still_completes() {
    let h = harness();
    let records = vec![
        lead("Jane", "Doe", Some("https://example.com/in/jane")),
        lead("John", "", Some("https://example.com/in/john")),
    ];

    let job_id = h.engine.create(records).await.unwrap();
    let job = wait_for_terminal(&h.store, job_id).await;

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.processed, 2);
    assert_eq!(job.error_count(), 1);

    // The invalid record never reaches the fetcher
    assert!(h.fetcher.was_fetched("https://example.com/in/jane"));
    assert!(!h.fetcher.was_fetched("https://example.com/in/john"));

    let rows = parse_export(job.artifact.as_deref().unwrap());
    assert_eq!(rows[1][1], "");
    assert!(rows[1][2].contains("last name is required"));
}

#[tokio::test]
async fn fetch_timeout_still_yields_a_generated_email() {
    let url = "https://example.com/in/slow";
    let fetcher = MockProfileFetcher::new().with_status(url, FetchStatus::Timeout);
    let h = harness_with(fetcher, MockAI::new(), fast_config());

    let job_id = h
        .engine
        .create(vec![lead("Slow", "Fetch", Some(url))])
        .await
        .unwrap();
    let job = wait_for_terminal(&h.store, job_id).await;

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.error_count(), 0);

    let outcome = &job.outcomes[0];
    assert!(outcome.is_success());
    match &outcome.result {
        server_core::kernel::jobs::OutcomeResult::Success { fetch_status, .. } => {
            assert_eq!(*fetch_status, Some(FetchStatus::Timeout));
        }
        other => panic!("expected success outcome, got {:?}", other),
    }

    // The degraded prompt uses lead fields only
    let prompts = h.ai.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Slow Fetch"));
    assert!(!prompts[0].contains("Mock headline"));
}

#[tokio::test]
async fn empty_batch_is_rejected_without_creating_a_job() {
    let h = harness();
    let err = h.engine.create(vec![]).await.unwrap_err();
    assert!(matches!(err, SubmitError::EmptyBatch));
    assert_eq!(h.store.len().await, 0);
}

#[tokio::test]
async fn all_invalid_batch_completes_with_zero_successes() {
    let h = harness();
    let records = vec![lead("", "Doe", None), lead("John", "", None)];

    let job_id = h.engine.create(records).await.unwrap();
    let job = wait_for_terminal(&h.store, job_id).await;

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.processed, 2);
    assert_eq!(job.success_count(), 0);
    assert_eq!(job.error_count(), 2);
    assert!(job.artifact.is_some());
    assert!(h.fetcher.calls().is_empty());
}

// =============================================================================
// Concurrency and progress properties
// =============================================================================

#[tokio::test]
async fn processed_is_monotonic_and_bounded_by_total() {
    let fetcher = MockProfileFetcher::new().with_delay(Duration::from_millis(30));
    let h = harness_with(
        fetcher,
        MockAI::new(),
        EngineConfig {
            fetch_concurrency: 2,
            generation_timeout: Duration::from_secs(5),
        },
    );

    let records = (0..6)
        .map(|i| lead("Lead", &format!("Number{}", i), Some("https://example.com/in/x")))
        .collect();
    let job_id = h.engine.create(records).await.unwrap();

    let mut last = 0;
    loop {
        let job = h.store.get(job_id).await.unwrap().unwrap();
        assert!(job.processed >= last, "processed went backwards");
        assert!(job.processed <= job.total);
        assert_eq!(job.outcomes.len(), job.processed);
        last = job.processed;
        if job.status.is_terminal() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let job = h.store.get(job_id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.processed, 6);
}

#[tokio::test]
async fn concurrent_fetches_never_exceed_the_pool_size() {
    let fetcher = MockProfileFetcher::new().with_delay(Duration::from_millis(50));
    let h = harness_with(
        fetcher,
        MockAI::new(),
        EngineConfig {
            fetch_concurrency: 3,
            generation_timeout: Duration::from_secs(5),
        },
    );

    let records = (0..8)
        .map(|i| lead("Lead", &format!("Number{}", i), Some("https://example.com/in/x")))
        .collect();
    let job_id = h.engine.create(records).await.unwrap();
    wait_for_terminal(&h.store, job_id).await;

    assert!(h.fetcher.max_in_flight() <= 3);
    assert_eq!(h.fetcher.calls().len(), 8);
}

#[tokio::test]
async fn outcomes_cover_every_input_index_exactly_once() {
    let h = harness();
    let records = (0..5)
        .map(|i| lead("Lead", &format!("Number{}", i), Some("https://example.com/in/x")))
        .collect();

    let job_id = h.engine.create(records).await.unwrap();
    let job = wait_for_terminal(&h.store, job_id).await;

    let mut indices: Vec<usize> = job.outcomes.iter().map(|o| o.index).collect();
    indices.sort_unstable();
    assert_eq!(indices, vec![0, 1, 2, 3, 4]);
}

#[tokio::test]
async fn generation_failure_is_record_level_not_job_level() {
    let ai = MockAI::new().failing_with("model unavailable");
    let h = harness_with(MockProfileFetcher::new(), ai, fast_config());

    let job_id = h
        .engine
        .create(vec![lead("Jane", "Doe", Some("https://example.com/in/jane"))])
        .await
        .unwrap();
    let job = wait_for_terminal(&h.store, job_id).await;

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.error_count(), 1);
    let rows = parse_export(job.artifact.as_deref().unwrap());
    assert!(rows[0][2].contains("model unavailable"));
}

// =============================================================================
// Infrastructure failure
// =============================================================================

/// Delegating store that fails exactly one update call.
struct FlakyStore {
    inner: InMemoryJobStore,
    update_calls: AtomicUsize,
    fail_on_call: usize,
}

impl FlakyStore {
    fn failing_on(call: usize) -> Self {
        Self {
            inner: InMemoryJobStore::new(),
            update_calls: AtomicUsize::new(0),
            fail_on_call: call,
        }
    }
}

#[async_trait]
impl JobStore for FlakyStore {
    async fn put(&self, job: Job) -> Result<(), StoreError> {
        self.inner.put(job).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<Job>, StoreError> {
        self.inner.get(id).await
    }

    async fn update(&self, id: Uuid, mutate: Mutator) -> Result<Job, StoreError> {
        let call = self.update_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.fail_on_call {
            return Err(StoreError::Unavailable("injected outage".to_string()));
        }
        self.inner.update(id, mutate).await
    }

    async fn evict_finished(&self, older_than: DateTime<Utc>) -> Result<u64, StoreError> {
        self.inner.evict_finished(older_than).await
    }
}

#[tokio::test]
async fn store_failure_fails_the_job_and_offers_no_artifact() {
    // Call 1 is begin_processing, call 2 is the first outcome write
    let store = Arc::new(FlakyStore::failing_on(2));
    let fetcher = Arc::new(MockProfileFetcher::new());
    let ai = Arc::new(MockAI::new());
    let engine = JobEngine::new(
        store.clone(),
        fetcher,
        ai,
        EngineConfig {
            fetch_concurrency: 1,
            generation_timeout: Duration::from_secs(5),
        },
    );

    let records = vec![
        lead("Jane", "Doe", Some("https://example.com/in/jane")),
        lead("John", "Smith", Some("https://example.com/in/john")),
        lead("Ada", "Lovelace", Some("https://example.com/in/ada")),
    ];
    let job_id = engine.create(records).await.unwrap();

    let job = loop {
        let job = store.get(job_id).await.unwrap().unwrap();
        if job.status.is_terminal() {
            break job;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    };

    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.error.as_deref().unwrap().contains("injected outage"));
    assert!(job.artifact.is_none());
    assert!(job.completed_at.is_some());
}

// =============================================================================
// Snapshot idempotence
// =============================================================================

#[tokio::test]
async fn status_reads_without_processing_are_identical() {
    let h = harness();
    let job_id = h
        .engine
        .create(vec![lead("Jane", "Doe", None)])
        .await
        .unwrap();
    wait_for_terminal(&h.store, job_id).await;

    let first = h.engine.snapshot(job_id).await.unwrap().unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    let second = h.engine.snapshot(job_id).await.unwrap().unwrap();
    assert_eq!(first, second);
}
