//! Bulk personalization job engine.
//!
//! The engine owns one job per submitted batch and is its only writer:
//! - `create` persists a queued job and spawns asynchronous processing
//! - the run loop dispatches records in input order under a bounded,
//!   process-wide fetch pool
//! - each record runs validate -> fetch -> generate; its outcome is
//!   recorded with a single atomic store update
//! - when every record is accounted for, the export is assembled and the
//!   job completes
//!
//! # Architecture
//!
//! ```text
//! JobEngine.create(records)
//!     │
//!     ├─► store.put(Job::new)            (status: queued)
//!     └─► tokio::spawn(run)
//!             ├─► store.update(begin)    (status: processing)
//!             ├─► per record: acquire permit ─► validate ─► fetch ─► generate
//!             │       └─► store.update(record_outcome)
//!             └─► store.update(assemble + complete | fail)
//! ```
//!
//! Record-level failures (validation, generation) become failed outcomes and
//! never fail the job; only infrastructure failures (the store refusing a
//! write, the pool being unschedulable) transition the job to failed.
//!
//! Fairness: the fetch pool is one process-wide FIFO semaphore shared by all
//! jobs. Permits are granted in request order, so a large job ahead of a
//! small one delays it but can never starve it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::domains::leads::{self, LeadRecord};
use crate::kernel::traits::{BaseAI, BaseProfileFetcher};

use super::job::{Job, JobSnapshot, OutcomeErrorKind, OutcomeResult, RecordOutcome};
use super::store::{JobStore, StoreError};

/// Configuration for the job engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Cap on concurrent fetch pipelines across all jobs. Sized for the
    /// profile source's tolerance, not for throughput.
    pub fetch_concurrency: usize,
    /// Upper bound on one generation call
    pub generation_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fetch_concurrency: 4,
            generation_timeout: Duration::from_secs(60),
        }
    }
}

/// Errors surfaced by `create`. Everything past submission is reported
/// through the job's own status.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("batch contains no records")]
    EmptyBatch,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Cheaply cloneable handle; all state is shared behind `Arc`s, so clones
/// drive the same pool and the same store.
#[derive(Clone)]
pub struct JobEngine {
    store: Arc<dyn JobStore>,
    fetcher: Arc<dyn BaseProfileFetcher>,
    ai: Arc<dyn BaseAI>,
    permits: Arc<Semaphore>,
    config: EngineConfig,
}

impl JobEngine {
    pub fn new(
        store: Arc<dyn JobStore>,
        fetcher: Arc<dyn BaseProfileFetcher>,
        ai: Arc<dyn BaseAI>,
        config: EngineConfig,
    ) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(config.fetch_concurrency)),
            store,
            fetcher,
            ai,
            config,
        }
    }

    /// Create a job for a batch and schedule its processing.
    /// Returns immediately with the job id; rejects an empty batch without
    /// creating anything.
    pub async fn create(&self, records: Vec<LeadRecord>) -> Result<Uuid, SubmitError> {
        if records.is_empty() {
            return Err(SubmitError::EmptyBatch);
        }

        let job = Job::new(records.len());
        let job_id = job.id;
        self.store.put(job).await?;

        info!(job_id = %job_id, total = records.len(), "job created");

        let engine = self.clone();
        tokio::spawn(async move {
            engine.run(job_id, records, CancellationToken::new()).await;
        });

        Ok(job_id)
    }

    /// Read-only snapshot for status polling.
    pub async fn snapshot(&self, job_id: Uuid) -> Result<Option<JobSnapshot>, StoreError> {
        Ok(self.store.get(job_id).await?.map(|job| job.snapshot()))
    }

    /// Drive one job to a terminal state. The cancellation token is checked
    /// between record dispatches; in-flight fetches still honor their own
    /// timeouts.
    async fn run(self, job_id: Uuid, records: Vec<LeadRecord>, cancel: CancellationToken) {
        if let Err(err) = self
            .store
            .update(job_id, Box::new(|job| job.begin_processing()))
            .await
        {
            error!(job_id = %job_id, error = %err, "could not start job processing");
            return;
        }

        // First store failure; set once, checked between dispatches.
        let fatal: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));
        let mut handles = Vec::with_capacity(records.len());

        for (index, record) in records.into_iter().enumerate() {
            if cancel.is_cancelled() || fatal.lock().await.is_some() {
                break;
            }

            // Admission control: the permit is acquired before the task is
            // spawned, so dispatch order is input order and admission across
            // jobs is the semaphore's FIFO order.
            let permit = match self.permits.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    let mut slot = fatal.lock().await;
                    if slot.is_none() {
                        *slot = Some("worker pool is no longer schedulable".to_string());
                    }
                    break;
                }
            };

            let engine = self.clone();
            let fatal = Arc::clone(&fatal);
            handles.push(tokio::spawn(async move {
                let _permit = permit;
                let outcome = engine.process_record(index, record).await;
                let recorded = engine
                    .store
                    .update(job_id, Box::new(move |job| job.record_outcome(outcome)))
                    .await;

                match recorded {
                    Ok(job) => {
                        debug!(job_id = %job_id, processed = job.processed, total = job.total, "outcome recorded");
                    }
                    Err(err) => {
                        warn!(job_id = %job_id, error = %err, "failed to record outcome");
                        let mut slot = fatal.lock().await;
                        if slot.is_none() {
                            *slot = Some(format!("job store rejected an update: {}", err));
                        }
                    }
                }
            }));
        }

        futures::future::join_all(handles).await;

        if let Some(message) = fatal.lock().await.take() {
            self.finish_failed(job_id, message).await;
            return;
        }
        if cancel.is_cancelled() {
            self.finish_failed(job_id, "job was cancelled".to_string())
                .await;
            return;
        }

        // Assemble inside the update so the outcome read and the artifact
        // write land in the same atomic step.
        let result = self
            .store
            .update(
                job_id,
                Box::new(|job| match leads::assemble(&job.outcomes) {
                    Ok((artifact, _)) => job.complete(artifact),
                    Err(err) => job.fail(format!("failed to assemble results: {}", err)),
                }),
            )
            .await;

        match result {
            Ok(job) => {
                info!(
                    job_id = %job_id,
                    status = job.status.as_str(),
                    processed = job.processed,
                    errors = job.error_count(),
                    "job finished"
                );
            }
            Err(err) => error!(job_id = %job_id, error = %err, "failed to finalize job"),
        }
    }

    async fn finish_failed(&self, job_id: Uuid, message: String) {
        warn!(job_id = %job_id, error = %message, "job failed");
        // Best effort: if the store is down this will fail too, and the job
        // stays visibly stuck in processing rather than silently vanishing.
        if let Err(err) = self
            .store
            .update(job_id, Box::new(move |job| job.fail(message)))
            .await
        {
            error!(job_id = %job_id, error = %err, "failed to mark job as failed");
        }
    }

    /// Run one record through the pipeline. Never fails: every failure mode
    /// is folded into the returned outcome.
    async fn process_record(&self, index: usize, record: LeadRecord) -> RecordOutcome {
        let identity = record.identity();

        let lead = match leads::validate(&record) {
            Ok(lead) => lead,
            Err(violations) => {
                debug!(index, identity = %identity, "record failed validation");
                return RecordOutcome {
                    index,
                    identity,
                    result: OutcomeResult::Error {
                        kind: OutcomeErrorKind::Validation,
                        message: violations.join("; "),
                    },
                };
            }
        };

        // Fetch is best-effort: a degraded profile still feeds generation.
        let profile = match lead.profile_url.as_deref() {
            Some(url) => Some(self.fetcher.fetch(url).await),
            None => None,
        };

        let generated = leads::generate(
            &lead,
            profile.as_ref(),
            self.ai.as_ref(),
            self.config.generation_timeout,
        )
        .await;

        match generated {
            Ok(email) => RecordOutcome {
                index,
                identity,
                result: OutcomeResult::Success {
                    email: email.body,
                    profile_summary: profile.as_ref().and_then(|p| p.summary()),
                    fetch_status: profile.as_ref().map(|p| p.fetch_status),
                },
            },
            Err(err) => RecordOutcome {
                index,
                identity,
                result: OutcomeResult::Error {
                    kind: OutcomeErrorKind::Generation,
                    message: err.to_string(),
                },
            },
        }
    }
}
