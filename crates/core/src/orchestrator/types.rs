//! Types for the scrape orchestrator and collection pipeline.

use serde::Serialize;
use thiserror::Error;

use crate::adapter::{AdapterError, StatusSnapshot};
use crate::alert::RunAlert;
use crate::config::ScheduleMode;
use crate::health::HealthClass;
use crate::registry::RegistryError;
use crate::run::{RunStatus, TriggerSource};

/// Errors that abort a whole run (never a single resort's failure).
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Bad batch selector or unknown resort; raised before any run exists.
    #[error("invalid selection: {0}")]
    Config(#[from] RegistryError),

    /// Another run holds the pipeline.
    #[error("a collection run is already in progress")]
    RunInProgress,

    /// Store unavailable or write rejected.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Orchestration broke before outcomes could be recorded.
    #[error("run aborted: {0}")]
    Aborted(String),
}

/// Per-target result of one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ScrapeOutcome {
    Success(StatusSnapshot),
    Failure {
        resort_id: String,
        error: AdapterError,
        source_url: String,
    },
}

impl ScrapeOutcome {
    pub fn resort_id(&self) -> &str {
        match self {
            ScrapeOutcome::Success(snapshot) => &snapshot.resort_id,
            ScrapeOutcome::Failure { resort_id, .. } => resort_id,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ScrapeOutcome::Success(_))
    }
}

/// Outcomes in target order, exactly one per attempted resort.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ScrapeOutcomes(Vec<ScrapeOutcome>);

impl ScrapeOutcomes {
    pub fn new(outcomes: Vec<ScrapeOutcome>) -> Self {
        Self(outcomes)
    }

    pub fn get(&self, resort_id: &str) -> Option<&ScrapeOutcome> {
        self.0.iter().find(|o| o.resort_id() == resort_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScrapeOutcome> {
        self.0.iter()
    }

    pub fn resort_ids(&self) -> Vec<&str> {
        self.0.iter().map(|o| o.resort_id()).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn successes(&self) -> Vec<StatusSnapshot> {
        self.0
            .iter()
            .filter_map(|o| match o {
                ScrapeOutcome::Success(snapshot) => Some(snapshot.clone()),
                ScrapeOutcome::Failure { .. } => None,
            })
            .collect()
    }

    pub fn success_count(&self) -> u32 {
        self.0.iter().filter(|o| o.is_success()).count() as u32
    }

    pub fn failure_count(&self) -> u32 {
        self.0.iter().filter(|o| !o.is_success()).count() as u32
    }
}

impl IntoIterator for ScrapeOutcomes {
    type Item = ScrapeOutcome;
    type IntoIter = std::vec::IntoIter<ScrapeOutcome>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// What a caller learns about a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub status: RunStatus,
    pub trigger: TriggerSource,
    pub batch: Option<u8>,
    pub total: u32,
    pub successful: u32,
    pub failed: u32,
    pub duration_ms: u64,
    pub success_rate: f64,
    /// Classification of this run's own rate.
    pub health: HealthClass,
    pub message: String,
    pub outcomes: ScrapeOutcomes,
    pub alert: Option<RunAlert>,
}

/// Current scheduler state.
#[derive(Debug, Clone, Serialize)]
pub struct SchedulerStatus {
    pub running: bool,
    pub interval_secs: u64,
    pub mode: ScheduleMode,
    /// Batch the next rotating tick will scrape.
    pub next_batch: Option<u8>,
}
