use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::{RunError, RunFinish, RunRecord, RunStatus, TriggerSource};
use crate::store::{RunFilter, StatusStore, StoreError};

/// Reason recorded on runs swept as orphans.
pub const ORPHANED_REASON: &str = "orphaned";

/// Brackets each run with a persisted `running` record and its single
/// terminal transition.
#[derive(Clone)]
pub struct RunTracker {
    store: Arc<dyn StatusStore>,
}

impl RunTracker {
    pub fn new(store: Arc<dyn StatusStore>) -> Self {
        Self { store }
    }

    /// Persist a `running` record. Nothing may be scraped unless this succeeds.
    pub fn start(
        &self,
        total: u32,
        trigger: TriggerSource,
        batch: Option<u8>,
    ) -> Result<ActiveRun, RunError> {
        let record = RunRecord::start(total, trigger, batch);
        self.store.create_run(&record)?;
        info!(
            run_id = %record.run_id,
            total,
            trigger = %trigger,
            batch = ?batch,
            "Run started"
        );
        Ok(ActiveRun {
            store: Arc::clone(&self.store),
            record,
            started: Instant::now(),
            finished: false,
        })
    }

    /// Mark runs stuck in `running` for longer than `max_age` as failed.
    /// Returns the ids that were swept.
    pub fn sweep_orphans(&self, max_age: chrono::Duration) -> Result<Vec<String>, RunError> {
        let cutoff = Utc::now() - max_age;
        let running = self.store.list_runs(
            &RunFilter::default()
                .with_status(RunStatus::Running)
                .with_limit(1000),
        )?;

        let mut swept = Vec::new();
        for run in running.into_iter().filter(|r| r.started_at < cutoff) {
            let finish = RunFinish::Failed {
                reason: ORPHANED_REASON.to_string(),
                duration_ms: None,
            };
            match self.store.finish_run(&run.run_id, &finish, Utc::now()) {
                Ok(_) => {
                    warn!(run_id = %run.run_id, started_at = %run.started_at, "Swept orphaned run");
                    swept.push(run.run_id);
                }
                // Finished concurrently by its owner.
                Err(StoreError::AlreadyFinished(_)) => {
                    debug!(run_id = %run.run_id, "Orphan candidate already finished")
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(swept)
    }
}

/// A run between `start` and its terminal transition.
///
/// `complete` and `fail` consume the handle, so a run is finished at most once.
pub struct ActiveRun {
    store: Arc<dyn StatusStore>,
    record: RunRecord,
    started: Instant,
    finished: bool,
}

impl ActiveRun {
    pub fn run_id(&self) -> &str {
        &self.record.run_id
    }

    pub fn record(&self) -> &RunRecord {
        &self.record
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    /// Record the settled outcome counts. A count mismatch fails the run
    /// instead of completing it.
    pub fn complete(mut self, successful: u32, failed: u32) -> Result<RunRecord, RunError> {
        let total = self.record.total;
        let duration_ms = self.elapsed_ms();
        self.finished = true;

        if successful + failed != total {
            let reason = format!(
                "outcome count mismatch: {} + {} != {}",
                successful, failed, total
            );
            self.finish(RunFinish::Failed {
                reason,
                duration_ms: Some(duration_ms),
            })?;
            return Err(RunError::CountMismatch {
                successful,
                failed,
                total,
            });
        }

        let record = self.finish(RunFinish::Completed {
            successful,
            failed,
            duration_ms,
        })?;
        info!(
            run_id = %record.run_id,
            successful,
            failed,
            duration_ms,
            "Run completed"
        );
        Ok(record)
    }

    /// Abort the run without outcome counts.
    pub fn fail(mut self, reason: impl Into<String>) -> Result<RunRecord, RunError> {
        let reason = reason.into();
        let duration_ms = self.elapsed_ms();
        self.finished = true;
        warn!(run_id = %self.record.run_id, reason = %reason, "Run failed");
        self.finish(RunFinish::Failed {
            reason,
            duration_ms: Some(duration_ms),
        })
    }

    fn finish(&self, finish: RunFinish) -> Result<RunRecord, RunError> {
        Ok(self
            .store
            .finish_run(&self.record.run_id, &finish, Utc::now())?)
    }
}

impl Drop for ActiveRun {
    fn drop(&mut self) {
        if !self.finished {
            warn!(
                run_id = %self.record.run_id,
                "Run dropped while still running; it will be swept as an orphan"
            );
        }
    }
}
