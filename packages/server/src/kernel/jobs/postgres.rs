//! Postgres-backed job store.
//!
//! Gives the job table the shared/external shape: any process instance can
//! read a job another instance wrote. `update` takes a row lock
//! (`SELECT ... FOR UPDATE`) inside a transaction, so concurrent updates of
//! one job serialize at the database and readers outside the transaction
//! see either the pre- or post-update row.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::job::{Job, JobStatus, RecordOutcome};
use super::store::{JobStore, Mutator, StoreError};

pub struct PostgresJobStore {
    pool: PgPool,
}

impl PostgresJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct JobRow {
    id: Uuid,
    status: JobStatus,
    total: i32,
    processed: i32,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    last_progress_at: Option<DateTime<Utc>>,
    outcomes: Json<Vec<RecordOutcome>>,
    artifact: Option<Vec<u8>>,
    error: Option<String>,
}

impl From<JobRow> for Job {
    fn from(row: JobRow) -> Self {
        Job {
            id: row.id,
            status: row.status,
            total: row.total as usize,
            processed: row.processed as usize,
            started_at: row.started_at,
            completed_at: row.completed_at,
            last_progress_at: row.last_progress_at,
            outcomes: row.outcomes.0,
            artifact: row.artifact,
            error: row.error,
        }
    }
}

const SELECT_COLUMNS: &str = "id, status, total, processed, started_at, completed_at, \
                              last_progress_at, outcomes, artifact, error";

fn unavailable(err: sqlx::Error) -> StoreError {
    StoreError::Unavailable(err.to_string())
}

#[async_trait]
impl JobStore for PostgresJobStore {
    async fn put(&self, job: Job) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO jobs (
                id, status, total, processed, started_at, completed_at,
                last_progress_at, outcomes, artifact, error
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(job.id)
        .bind(job.status)
        .bind(job.total as i32)
        .bind(job.processed as i32)
        .bind(job.started_at)
        .bind(job.completed_at)
        .bind(job.last_progress_at)
        .bind(Json(&job.outcomes))
        .bind(&job.artifact)
        .bind(&job.error)
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Job>, StoreError> {
        let row = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {} FROM jobs WHERE id = $1",
            SELECT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(row.map(Job::from))
    }

    async fn update(&self, id: Uuid, mutate: Mutator) -> Result<Job, StoreError> {
        let mut tx = self.pool.begin().await.map_err(unavailable)?;

        let row = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {} FROM jobs WHERE id = $1 FOR UPDATE",
            SELECT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(unavailable)?;

        let mut job = Job::from(row.ok_or(StoreError::NotFound(id))?);
        mutate(&mut job);

        sqlx::query(
            r#"
            UPDATE jobs SET
                status = $1, processed = $2, completed_at = $3,
                last_progress_at = $4, outcomes = $5, artifact = $6, error = $7
            WHERE id = $8
            "#,
        )
        .bind(job.status)
        .bind(job.processed as i32)
        .bind(job.completed_at)
        .bind(job.last_progress_at)
        .bind(Json(&job.outcomes))
        .bind(&job.artifact)
        .bind(&job.error)
        .bind(job.id)
        .execute(&mut *tx)
        .await
        .map_err(unavailable)?;

        tx.commit().await.map_err(unavailable)?;
        Ok(job)
    }

    async fn evict_finished(&self, older_than: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            DELETE FROM jobs
            WHERE status IN ('completed', 'failed')
              AND completed_at < $1
            "#,
        )
        .bind(older_than)
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(result.rows_affected())
    }
}
