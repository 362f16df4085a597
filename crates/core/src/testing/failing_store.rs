//! A store that is never reachable.

use chrono::{DateTime, Utc};

use crate::adapter::StatusSnapshot;
use crate::run::{RunFinish, RunRecord};
use crate::store::{
    FailureFilter, FailureRecord, FailureWithRun, ResortFailureCount, RunFilter, RunStats,
    StatusStore, StoreError,
};

/// Every call fails with `StoreError::Unavailable`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingStore;

fn unavailable<T>() -> Result<T, StoreError> {
    Err(StoreError::Unavailable("store unreachable".to_string()))
}

impl StatusStore for FailingStore {
    fn backend_name(&self) -> &'static str {
        "failing"
    }

    fn create_run(&self, _run: &RunRecord) -> Result<(), StoreError> {
        unavailable()
    }

    fn finish_run(
        &self,
        _run_id: &str,
        _finish: &RunFinish,
        _at: DateTime<Utc>,
    ) -> Result<RunRecord, StoreError> {
        unavailable()
    }

    fn get_run(&self, _run_id: &str) -> Result<Option<RunRecord>, StoreError> {
        unavailable()
    }

    fn list_runs(&self, _filter: &RunFilter) -> Result<Vec<RunRecord>, StoreError> {
        unavailable()
    }

    fn save_many(&self, _snapshots: &[StatusSnapshot]) -> Result<usize, StoreError> {
        unavailable()
    }

    fn save_failure(&self, _failure: &FailureRecord) -> Result<(), StoreError> {
        unavailable()
    }

    fn get(&self, _resort_id: &str) -> Result<Option<StatusSnapshot>, StoreError> {
        unavailable()
    }

    fn get_all(&self) -> Result<Vec<StatusSnapshot>, StoreError> {
        unavailable()
    }

    fn history(&self, _resort_id: &str, _limit: usize) -> Result<Vec<StatusSnapshot>, StoreError> {
        unavailable()
    }

    fn recent_failures(&self, _filter: &FailureFilter) -> Result<Vec<FailureWithRun>, StoreError> {
        unavailable()
    }

    fn failure_counts(&self, _since: DateTime<Utc>) -> Result<Vec<ResortFailureCount>, StoreError> {
        unavailable()
    }

    fn get_stats(&self, _since: DateTime<Utc>) -> Result<RunStats, StoreError> {
        unavailable()
    }
}
