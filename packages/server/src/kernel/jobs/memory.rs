//! In-process job store.
//!
//! The single-binary default. A `RwLock` over the job table gives `update`
//! its atomicity: the write guard spans the whole read-modify-write, so
//! concurrent updates of one job serialize and readers only ever see a
//! settled snapshot.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::job::Job;
use super::store::{JobStore, Mutator, StoreError};

#[derive(Default)]
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<Uuid, Job>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored jobs. Test and diagnostics helper.
    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn put(&self, job: Job) -> Result<(), StoreError> {
        self.jobs.write().await.insert(job.id, job);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Job>, StoreError> {
        Ok(self.jobs.read().await.get(&id).cloned())
    }

    async fn update(&self, id: Uuid, mutate: Mutator) -> Result<Job, StoreError> {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        mutate(job);
        Ok(job.clone())
    }

    async fn evict_finished(&self, older_than: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut jobs = self.jobs.write().await;
        let before = jobs.len();
        jobs.retain(|_, job| {
            !(job.status.is_terminal()
                && job.completed_at.map(|at| at < older_than).unwrap_or(false))
        });
        Ok((before - jobs.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::jobs::job::{OutcomeResult, RecordOutcome};

    fn outcome(index: usize) -> RecordOutcome {
        RecordOutcome {
            index,
            identity: format!("Lead {}", index),
            result: OutcomeResult::Success {
                email: "Hello".to_string(),
                profile_summary: None,
                fetch_status: None,
            },
        }
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let store = InMemoryJobStore::new();
        let job = Job::new(2);
        let id = job.id;
        store.put(job).await.unwrap();

        let loaded = store.get(id).await.unwrap().unwrap();
        assert_eq!(loaded.id, id);
        assert_eq!(loaded.total, 2);
    }

    #[tokio::test]
    async fn get_unknown_id_is_none() {
        let store = InMemoryJobStore::new();
        assert!(store.get(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_unknown_id_is_not_found() {
        let store = InMemoryJobStore::new();
        let id = Uuid::new_v4();
        let err = store
            .update(id, Box::new(|job| job.begin_processing()))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(got) if got == id));
    }

    #[tokio::test]
    async fn update_returns_post_update_snapshot() {
        let store = InMemoryJobStore::new();
        let job = Job::new(1);
        let id = job.id;
        store.put(job).await.unwrap();

        let updated = store
            .update(
                id,
                Box::new(|job| {
                    job.begin_processing();
                    job.record_outcome(outcome(0));
                }),
            )
            .await
            .unwrap();
        assert_eq!(updated.processed, 1);
        assert_eq!(updated.outcomes.len(), 1);
    }

    #[tokio::test]
    async fn concurrent_updates_all_apply() {
        let store = std::sync::Arc::new(InMemoryJobStore::new());
        let job = Job::new(50);
        let id = job.id;
        store.put(job).await.unwrap();
        store
            .update(id, Box::new(|job| job.begin_processing()))
            .await
            .unwrap();

        let mut handles = Vec::new();
        for i in 0..50 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .update(id, Box::new(move |job| job.record_outcome(outcome(i))))
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let job = store.get(id).await.unwrap().unwrap();
        assert_eq!(job.processed, 50);
        assert_eq!(job.outcomes.len(), 50);
    }

    #[tokio::test]
    async fn evicts_only_old_terminal_jobs() {
        let store = InMemoryJobStore::new();

        let mut finished = Job::new(1);
        finished.begin_processing();
        finished.record_outcome(outcome(0));
        finished.complete(vec![]);
        let finished_id = finished.id;

        let running = Job::new(1);
        let running_id = running.id;

        store.put(finished).await.unwrap();
        store.put(running).await.unwrap();

        let evicted = store
            .evict_finished(Utc::now() + chrono::Duration::seconds(1))
            .await
            .unwrap();
        assert_eq!(evicted, 1);
        assert!(store.get(finished_id).await.unwrap().is_none());
        assert!(store.get(running_id).await.unwrap().is_some());
    }
}
