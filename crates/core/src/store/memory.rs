use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use super::{
    FailureFilter, FailureRecord, FailureWithRun, ResortFailureCount, RunFilter, RunStats,
    StatusStore, StoreError,
};
use crate::adapter::StatusSnapshot;
use crate::run::{RunFinish, RunRecord, RunStatus};

#[derive(Default)]
struct MemoryState {
    runs: HashMap<String, RunRecord>,
    latest: BTreeMap<String, StatusSnapshot>,
    history: BTreeMap<(String, DateTime<Utc>), StatusSnapshot>,
    failures: Vec<FailureRecord>,
}

/// Ephemeral store for deployments without a writable disk.
///
/// Owned by whoever constructs it; contents live as long as the instance.
#[derive(Default)]
pub struct MemoryStatusStore {
    state: RwLock<MemoryState>,
}

impl MemoryStatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryState>, StoreError> {
        self.state
            .read()
            .map_err(|_| StoreError::Unavailable("state lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryState>, StoreError> {
        self.state
            .write()
            .map_err(|_| StoreError::Unavailable("state lock poisoned".to_string()))
    }
}

impl StatusStore for MemoryStatusStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn create_run(&self, run: &RunRecord) -> Result<(), StoreError> {
        let mut state = self.write()?;
        if state.runs.contains_key(&run.run_id) {
            return Err(StoreError::Database(format!(
                "run {} already exists",
                run.run_id
            )));
        }
        state.runs.insert(run.run_id.clone(), run.clone());
        Ok(())
    }

    fn finish_run(
        &self,
        run_id: &str,
        finish: &RunFinish,
        at: DateTime<Utc>,
    ) -> Result<RunRecord, StoreError> {
        let mut state = self.write()?;
        let run = state
            .runs
            .get_mut(run_id)
            .ok_or_else(|| StoreError::NotFound(format!("run {}", run_id)))?;
        if run.status != RunStatus::Running {
            return Err(StoreError::AlreadyFinished(run_id.to_string()));
        }

        run.status = finish.status();
        run.completed_at = Some(at);
        match finish {
            RunFinish::Completed {
                successful,
                failed,
                duration_ms,
            } => {
                run.successful = Some(*successful);
                run.failed = Some(*failed);
                run.duration_ms = Some(*duration_ms);
            }
            RunFinish::Failed {
                reason,
                duration_ms,
            } => {
                run.error = Some(reason.clone());
                run.duration_ms = *duration_ms;
            }
        }
        Ok(run.clone())
    }

    fn get_run(&self, run_id: &str) -> Result<Option<RunRecord>, StoreError> {
        Ok(self.read()?.runs.get(run_id).cloned())
    }

    fn list_runs(&self, filter: &RunFilter) -> Result<Vec<RunRecord>, StoreError> {
        let state = self.read()?;
        let mut runs: Vec<RunRecord> = state
            .runs
            .values()
            .filter(|r| filter.status.map_or(true, |s| r.status == s))
            .filter(|r| filter.since.map_or(true, |since| r.started_at >= since))
            .cloned()
            .collect();
        runs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        runs.truncate(filter.limit);
        Ok(runs)
    }

    fn save_many(&self, snapshots: &[StatusSnapshot]) -> Result<usize, StoreError> {
        let mut state = self.write()?;
        for snapshot in snapshots {
            state.history.insert(
                (snapshot.resort_id.clone(), snapshot.captured_at),
                snapshot.clone(),
            );
            let newer = state
                .latest
                .get(&snapshot.resort_id)
                .map_or(true, |current| snapshot.captured_at >= current.captured_at);
            if newer {
                state
                    .latest
                    .insert(snapshot.resort_id.clone(), snapshot.clone());
            }
        }
        Ok(snapshots.len())
    }

    fn save_failure(&self, failure: &FailureRecord) -> Result<(), StoreError> {
        let mut state = self.write()?;
        if !state.runs.contains_key(&failure.run_id) {
            return Err(StoreError::NotFound(format!("run {}", failure.run_id)));
        }
        state.failures.push(failure.clone());
        Ok(())
    }

    fn get(&self, resort_id: &str) -> Result<Option<StatusSnapshot>, StoreError> {
        Ok(self.read()?.latest.get(resort_id).cloned())
    }

    fn get_all(&self) -> Result<Vec<StatusSnapshot>, StoreError> {
        Ok(self.read()?.latest.values().cloned().collect())
    }

    fn history(&self, resort_id: &str, limit: usize) -> Result<Vec<StatusSnapshot>, StoreError> {
        let state = self.read()?;
        Ok(state
            .history
            .iter()
            .rev()
            .filter(|((id, _), _)| id == resort_id)
            .map(|(_, snapshot)| snapshot.clone())
            .take(limit)
            .collect())
    }

    fn recent_failures(&self, filter: &FailureFilter) -> Result<Vec<FailureWithRun>, StoreError> {
        let state = self.read()?;
        let mut matching: Vec<FailureWithRun> = state
            .failures
            .iter()
            .enumerate()
            .rev()
            .filter(|(_, f)| f.failed_at >= filter.since)
            .filter(|(_, f)| {
                filter
                    .resort_id
                    .as_deref()
                    .map_or(true, |id| f.resort_id == id)
            })
            .filter_map(|(_, f)| {
                state.runs.get(&f.run_id).map(|run| FailureWithRun {
                    failure: f.clone(),
                    run_total: run.total,
                    run_successful: run.successful,
                    run_failed: run.failed,
                    run_started_at: run.started_at,
                })
            })
            .collect();
        // Stable sort keeps insertion order (newest first) among equal timestamps.
        matching.sort_by(|a, b| b.failure.failed_at.cmp(&a.failure.failed_at));
        matching.truncate(filter.limit);
        Ok(matching)
    }

    fn failure_counts(&self, since: DateTime<Utc>) -> Result<Vec<ResortFailureCount>, StoreError> {
        let state = self.read()?;
        let mut counts: HashMap<&str, ResortFailureCount> = HashMap::new();
        for failure in state.failures.iter().filter(|f| f.failed_at >= since) {
            counts
                .entry(failure.resort_id.as_str())
                .and_modify(|c| {
                    c.count += 1;
                    c.last_failed_at = c.last_failed_at.max(failure.failed_at);
                })
                .or_insert_with(|| ResortFailureCount {
                    resort_id: failure.resort_id.clone(),
                    count: 1,
                    last_failed_at: failure.failed_at,
                });
        }
        let mut counts: Vec<_> = counts.into_values().collect();
        counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.resort_id.cmp(&b.resort_id)));
        Ok(counts)
    }

    fn get_stats(&self, since: DateTime<Utc>) -> Result<RunStats, StoreError> {
        let state = self.read()?;
        let completed: Vec<&RunRecord> = state
            .runs
            .values()
            .filter(|r| r.status == RunStatus::Completed && r.started_at >= since)
            .collect();
        if completed.is_empty() {
            return Ok(RunStats::default());
        }

        let n = completed.len() as f64;
        let sum = |f: fn(&RunRecord) -> f64| completed.iter().map(|r| f(r)).sum::<f64>() / n;
        Ok(RunStats {
            run_count: completed.len() as u32,
            avg_successful: sum(|r| r.successful.unwrap_or(0) as f64),
            avg_failed: sum(|r| r.failed.unwrap_or(0) as f64),
            avg_duration_ms: sum(|r| r.duration_ms.unwrap_or(0) as f64),
        })
    }
}
