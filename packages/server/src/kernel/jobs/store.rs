//! Job store contract.
//!
//! The store is the only shared mutable resource in the system. All writes
//! to a job serialize through [`JobStore::update`], an atomic
//! read-modify-write; readers see either the pre- or post-update snapshot,
//! never a partially applied one.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use super::job::Job;

/// Mutation applied under the store's per-job write serialization.
pub type Mutator = Box<dyn FnOnce(&mut Job) + Send>;

/// Store failures are infrastructure-level: the engine treats any of these
/// as fatal for the affected job.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("job {0} not found")]
    NotFound(Uuid),

    #[error("job store unavailable: {0}")]
    Unavailable(String),
}

/// Keyed job storage. `put` inserts, `get` reads a snapshot, `update`
/// applies a mutation atomically and returns the post-update snapshot.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn put(&self, job: Job) -> Result<(), StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<Job>, StoreError>;

    async fn update(&self, id: Uuid, mutate: Mutator) -> Result<Job, StoreError>;

    /// Remove terminal jobs whose completion predates `older_than`.
    /// Returns how many were evicted.
    async fn evict_finished(&self, older_than: DateTime<Utc>) -> Result<u64, StoreError>;
}
