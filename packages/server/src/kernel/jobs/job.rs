//! Job model for bulk personalization runs.

use chrono::{DateTime, Utc};
use profile_client::FetchStatus;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-record estimate used before any record has completed.
/// A heuristic carried from the reference behavior, not an SLA.
const DEFAULT_SECONDS_PER_RECORD: u64 = 8;

/// How many of the most recent errors a status snapshot carries.
const RECENT_ERRORS_WINDOW: usize = 5;

// ============================================================================
// Enums
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "job_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Terminal states absorb: no transition leaves them.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

/// Record-level error classification. Fetch failures are not here: the
/// fetcher degrades to a best-effort profile instead of failing the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeErrorKind {
    Validation,
    Generation,
}

// ============================================================================
// Record outcomes
// ============================================================================

/// Result of one record's pipeline, success or error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutcomeResult {
    Success {
        email: String,
        profile_summary: Option<String>,
        fetch_status: Option<FetchStatus>,
    },
    Error {
        #[serde(rename = "error_kind")]
        kind: OutcomeErrorKind,
        message: String,
    },
}

/// One completed unit of work within a job.
///
/// Outcomes are appended in completion order, which under concurrency is
/// not input order; `index` preserves the origin position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordOutcome {
    pub index: usize,
    pub identity: String,
    pub result: OutcomeResult,
}

impl RecordOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.result, OutcomeResult::Success { .. })
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.result {
            OutcomeResult::Error { message, .. } => Some(message),
            OutcomeResult::Success { .. } => None,
        }
    }

    pub fn email(&self) -> Option<&str> {
        match &self.result {
            OutcomeResult::Success { email, .. } => Some(email),
            OutcomeResult::Error { .. } => None,
        }
    }
}

// ============================================================================
// Job
// ============================================================================

/// One personalization run over a submitted batch.
///
/// Only the job engine mutates a `Job`, and every mutation goes through the
/// store's atomic `update`, so `processed` and `outcomes` always move
/// together and readers never observe a torn state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub status: JobStatus,
    pub total: usize,
    pub processed: usize,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// When the most recent outcome was recorded; drives the remaining-time
    /// estimate without making repeated reads drift.
    pub last_progress_at: Option<DateTime<Utc>>,
    pub outcomes: Vec<RecordOutcome>,
    /// Assembled CSV export, present only once the job completed
    pub artifact: Option<Vec<u8>>,
    /// Terminal infrastructure error, present only when the job failed
    pub error: Option<String>,
}

impl Job {
    pub fn new(total: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            status: JobStatus::Queued,
            total,
            processed: 0,
            started_at: Utc::now(),
            completed_at: None,
            last_progress_at: None,
            outcomes: Vec::new(),
            artifact: None,
            error: None,
        }
    }

    /// Queued -> Processing. No-op once terminal.
    pub fn begin_processing(&mut self) {
        if self.status == JobStatus::Queued {
            self.status = JobStatus::Processing;
        }
    }

    /// Append an outcome and advance `processed` together.
    /// Ignored once terminal or once every record is accounted for.
    pub fn record_outcome(&mut self, outcome: RecordOutcome) {
        if self.status.is_terminal() || self.processed >= self.total {
            return;
        }
        self.outcomes.push(outcome);
        self.processed += 1;
        self.last_progress_at = Some(Utc::now());
    }

    /// Transition to Completed with the assembled artifact.
    /// Requires every record to be accounted for; no-op once terminal.
    pub fn complete(&mut self, artifact: Vec<u8>) {
        if self.status.is_terminal() || self.processed != self.total {
            return;
        }
        self.artifact = Some(artifact);
        self.completed_at = Some(Utc::now());
        self.status = JobStatus::Completed;
    }

    /// Transition to Failed with a terminal error. No-op once terminal.
    pub fn fail(&mut self, error: impl Into<String>) {
        if self.status.is_terminal() {
            return;
        }
        self.error = Some(error.into());
        self.completed_at = Some(Utc::now());
        self.status = JobStatus::Failed;
    }

    pub fn error_count(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_success()).count()
    }

    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    /// Derive the read-only view served to pollers.
    pub fn snapshot(&self) -> JobSnapshot {
        let remaining = self.total.saturating_sub(self.processed);

        let progress_percent = if self.total == 0 {
            0
        } else {
            ((self.processed as f64 / self.total as f64) * 100.0).round() as u8
        };

        let estimated_remaining_seconds = if self.status.is_terminal() {
            0
        } else if self.processed == 0 {
            DEFAULT_SECONDS_PER_RECORD * remaining as u64
        } else {
            // Mean time per completed record, measured at the last outcome
            // so that reads with no intervening progress are identical.
            let elapsed = self.last_progress_at.unwrap_or(self.started_at) - self.started_at;
            let mean_ms = elapsed.num_milliseconds().max(0) as f64 / self.processed as f64;
            ((mean_ms * remaining as f64) / 1000.0).round() as u64
        };

        let recent_errors = self
            .outcomes
            .iter()
            .rev()
            .filter(|o| !o.is_success())
            .take(RECENT_ERRORS_WINDOW)
            .map(|o| RecentError {
                index: o.index,
                identity: o.identity.clone(),
                error: o.error_message().unwrap_or_default().to_string(),
            })
            .collect();

        JobSnapshot {
            id: self.id,
            status: self.status,
            processed: self.processed,
            total: self.total,
            progress_percent,
            estimated_remaining_seconds,
            error_count: self.error_count(),
            recent_errors,
        }
    }
}

// ============================================================================
// Snapshot
// ============================================================================

/// Read-only job view for status polling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub id: Uuid,
    pub status: JobStatus,
    pub processed: usize,
    pub total: usize,
    pub progress_percent: u8,
    pub estimated_remaining_seconds: u64,
    pub error_count: usize,
    pub recent_errors: Vec<RecentError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentError {
    pub index: usize,
    pub identity: String,
    pub error: String,
}
