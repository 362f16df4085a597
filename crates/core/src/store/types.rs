use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::adapter::StatusSnapshot;
use crate::run::{RunFinish, RunRecord, RunStatus};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Run {0} is already finished")]
    AlreadyFinished(String),
}

/// One failed outcome, tied to the run that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub run_id: String,
    pub resort_id: String,
    /// "network", "parse" or "timeout"
    pub error_kind: String,
    pub message: String,
    pub source_url: String,
    pub failed_at: DateTime<Utc>,
}

/// A failure annotated with its owning run's aggregates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureWithRun {
    #[serde(flatten)]
    pub failure: FailureRecord,
    pub run_total: u32,
    pub run_successful: Option<u32>,
    pub run_failed: Option<u32>,
    pub run_started_at: DateTime<Utc>,
}

/// Failure count for one resort over a window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResortFailureCount {
    pub resort_id: String,
    pub count: u32,
    pub last_failed_at: DateTime<Utc>,
}

/// Aggregates over completed runs in a window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RunStats {
    pub run_count: u32,
    pub avg_successful: f64,
    pub avg_failed: f64,
    pub avg_duration_ms: f64,
}

impl RunStats {
    pub fn success_rate(&self) -> f64 {
        if self.run_count == 0 {
            return 0.0;
        }
        crate::health::success_rate(self.avg_successful, self.avg_failed)
    }
}

/// Filter for listing runs
#[derive(Debug, Clone)]
pub struct RunFilter {
    pub status: Option<RunStatus>,
    pub since: Option<DateTime<Utc>>,
    pub limit: usize,
}

impl Default for RunFilter {
    fn default() -> Self {
        Self {
            status: None,
            since: None,
            limit: 50,
        }
    }
}

impl RunFilter {
    pub fn with_status(mut self, status: RunStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

/// Filter for querying failures
#[derive(Debug, Clone)]
pub struct FailureFilter {
    pub since: DateTime<Utc>,
    pub resort_id: Option<String>,
    pub limit: usize,
}

impl FailureFilter {
    pub fn since(since: DateTime<Utc>) -> Self {
        Self {
            since,
            resort_id: None,
            limit: 100,
        }
    }

    pub fn with_resort(mut self, resort_id: impl Into<String>) -> Self {
        self.resort_id = Some(resort_id.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

/// Durable record of runs, latest status, history and failures.
///
/// Implementations are selected once at startup and shared behind an `Arc`.
pub trait StatusStore: Send + Sync {
    /// "sqlite" or "memory"
    fn backend_name(&self) -> &'static str;

    /// Persist a new `running` record.
    fn create_run(&self, run: &RunRecord) -> Result<(), StoreError>;

    /// Apply the single terminal transition to a running record.
    fn finish_run(
        &self,
        run_id: &str,
        finish: &RunFinish,
        at: DateTime<Utc>,
    ) -> Result<RunRecord, StoreError>;

    fn get_run(&self, run_id: &str) -> Result<Option<RunRecord>, StoreError>;

    /// Runs newest first.
    fn list_runs(&self, filter: &RunFilter) -> Result<Vec<RunRecord>, StoreError>;

    /// Upsert history by (resort_id, captured_at) and the latest view per
    /// resort. Returns the number of snapshots written.
    fn save_many(&self, snapshots: &[StatusSnapshot]) -> Result<usize, StoreError>;

    /// Append a failure. The run must exist.
    fn save_failure(&self, failure: &FailureRecord) -> Result<(), StoreError>;

    /// Latest snapshot for one resort.
    fn get(&self, resort_id: &str) -> Result<Option<StatusSnapshot>, StoreError>;

    /// Latest snapshot per resort, ordered by resort id.
    fn get_all(&self) -> Result<Vec<StatusSnapshot>, StoreError>;

    /// History for one resort, newest first.
    fn history(&self, resort_id: &str, limit: usize) -> Result<Vec<StatusSnapshot>, StoreError>;

    /// Failures newest first, joined with their run.
    fn recent_failures(&self, filter: &FailureFilter) -> Result<Vec<FailureWithRun>, StoreError>;

    /// Per-resort failure counts since a point in time, most failures first.
    fn failure_counts(&self, since: DateTime<Utc>) -> Result<Vec<ResortFailureCount>, StoreError>;

    /// Aggregates over completed runs started at or after `since`.
    fn get_stats(&self, since: DateTime<Utc>) -> Result<RunStats, StoreError>;
}
