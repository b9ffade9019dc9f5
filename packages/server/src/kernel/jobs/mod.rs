//! Job infrastructure for bulk personalization runs.
//!
//! - [`Job`] - the per-batch state machine record
//! - [`JobStore`] - atomic keyed storage ([`InMemoryJobStore`] default,
//!   [`PostgresJobStore`] when a database is configured)
//! - [`JobEngine`] - creates jobs and drives their processing
//!
//! Domain logic (what a record pipeline does) lives in `domains::leads`;
//! this module only provides the machinery that runs it.

mod engine;
mod job;
mod memory;
mod postgres;
mod store;

pub use engine::{EngineConfig, JobEngine, SubmitError};
pub use job::{
    Job, JobSnapshot, JobStatus, OutcomeErrorKind, OutcomeResult, RecentError, RecordOutcome,
};
pub use memory::InMemoryJobStore;
pub use postgres::PostgresJobStore;
pub use store::{JobStore, Mutator, StoreError};
