use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::StoreError;

/// Lifecycle state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "running" => Some(RunStatus::Running),
            "completed" => Some(RunStatus::Completed),
            "failed" => Some(RunStatus::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What started a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerSource {
    Manual,
    Cron,
    Batch,
}

impl TriggerSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerSource::Manual => "manual",
            TriggerSource::Cron => "cron",
            TriggerSource::Batch => "batch",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "manual" => Some(TriggerSource::Manual),
            "cron" => Some(TriggerSource::Cron),
            "batch" => Some(TriggerSource::Batch),
            _ => None,
        }
    }
}

impl std::fmt::Display for TriggerSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persistent record of one orchestration invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: String,
    /// Targets attempted.
    pub total: u32,
    /// Set on completion only.
    pub successful: Option<u32>,
    pub failed: Option<u32>,
    pub duration_ms: Option<u64>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub status: RunStatus,
    pub trigger: TriggerSource,
    /// Batch number for batch runs, `None` for full-roster runs.
    pub batch: Option<u8>,
    /// Abort reason for failed runs.
    pub error: Option<String>,
}

impl RunRecord {
    /// A fresh `running` record with a generated id.
    pub fn start(total: u32, trigger: TriggerSource, batch: Option<u8>) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            total,
            successful: None,
            failed: None,
            duration_ms: None,
            started_at: Utc::now(),
            completed_at: None,
            status: RunStatus::Running,
            trigger,
            batch,
            error: None,
        }
    }

    /// Percentage of targets that succeeded, for completed runs.
    pub fn success_rate(&self) -> Option<f64> {
        match (self.successful, self.failed) {
            (Some(s), Some(f)) => Some(crate::health::success_rate(s as f64, f as f64)),
            _ => None,
        }
    }
}

/// Terminal transition applied to a running record.
#[derive(Debug, Clone, PartialEq)]
pub enum RunFinish {
    Completed {
        successful: u32,
        failed: u32,
        duration_ms: u64,
    },
    Failed {
        reason: String,
        duration_ms: Option<u64>,
    },
}

impl RunFinish {
    pub fn status(&self) -> RunStatus {
        match self {
            RunFinish::Completed { .. } => RunStatus::Completed,
            RunFinish::Failed { .. } => RunStatus::Failed,
        }
    }
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("Run store error: {0}")]
    Store(#[from] StoreError),

    #[error("Outcome counts do not add up: {successful} + {failed} != {total}")]
    CountMismatch {
        successful: u32,
        failed: u32,
        total: u32,
    },
}
