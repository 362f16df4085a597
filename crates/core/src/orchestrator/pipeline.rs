//! One complete collection run: bracket, fan out, persist, alert.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::adapter::AdapterRegistry;
use crate::alert::{AlertHandle, RunAlert};
use crate::health::HealthClass;
use crate::metrics::{RUNS_TOTAL, RUN_SUCCESS_RATE};
use crate::registry::{BatchSelection, ResortRegistry};
use crate::run::{ActiveRun, RunError, RunRecord, RunStatus, RunTracker, TriggerSource};
use crate::store::{FailureRecord, StatusStore, StoreError};

use super::config::OrchestratorConfig;
use super::runner::ScrapeOrchestrator;
use super::types::{PipelineError, RunReport, ScrapeOutcome, ScrapeOutcomes};

/// Runs are single-flight: an overlapping trigger is rejected, not queued.
pub struct CollectionPipeline {
    orchestrator: ScrapeOrchestrator,
    tracker: RunTracker,
    store: Arc<dyn StatusStore>,
    alerts: AlertHandle,
    in_flight: Mutex<()>,
}

impl CollectionPipeline {
    pub fn new(
        registry: Arc<ResortRegistry>,
        adapters: AdapterRegistry,
        store: Arc<dyn StatusStore>,
        alerts: AlertHandle,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            orchestrator: ScrapeOrchestrator::new(registry, adapters, config),
            tracker: RunTracker::new(Arc::clone(&store)),
            store,
            alerts,
            in_flight: Mutex::new(()),
        }
    }

    pub fn registry(&self) -> &ResortRegistry {
        self.orchestrator.registry()
    }

    pub fn store(&self) -> &Arc<dyn StatusStore> {
        &self.store
    }

    pub fn tracker(&self) -> &RunTracker {
        &self.tracker
    }

    /// Whether a run currently holds the pipeline.
    pub fn is_running(&self) -> bool {
        self.in_flight.try_lock().is_err()
    }

    pub async fn run_all(&self, trigger: TriggerSource) -> Result<RunReport, PipelineError> {
        self.execute(BatchSelection::All, trigger).await
    }

    pub async fn run_batch(
        &self,
        batch: u8,
        trigger: TriggerSource,
    ) -> Result<RunReport, PipelineError> {
        self.execute(BatchSelection::Batch(batch), trigger).await
    }

    /// Execute one run.
    ///
    /// Invalid selections and overlapping triggers are rejected before a run
    /// record exists. Once started, the run ends `completed` unless the store
    /// fails, in which case it is marked `failed` and the error returned.
    pub async fn execute(
        &self,
        selection: BatchSelection,
        trigger: TriggerSource,
    ) -> Result<RunReport, PipelineError> {
        let targets = self.registry().resolve(selection)?;
        let _guard = self
            .in_flight
            .try_lock()
            .map_err(|_| PipelineError::RunInProgress)?;

        let run = match self
            .tracker
            .start(targets.len() as u32, trigger, selection.batch_number())
        {
            Ok(run) => run,
            Err(e) => {
                error!(selection = %selection, error = %e, "Could not start run");
                RUNS_TOTAL
                    .with_label_values(&[trigger.as_str(), RunStatus::Failed.as_str()])
                    .inc();
                return Err(PipelineError::Persistence(e.to_string()));
            }
        };

        let outcomes = self.orchestrator.run_targets(&targets).await;
        if outcomes.len() != targets.len() {
            let reason = format!(
                "expected {} outcomes, got {}",
                targets.len(),
                outcomes.len()
            );
            return Err(self.abort(run, trigger, PipelineError::Aborted(reason)));
        }

        if let Err(e) = self.persist(run.run_id(), &outcomes) {
            return Err(self.abort(run, trigger, PipelineError::Persistence(e.to_string())));
        }

        let record = run
            .complete(outcomes.success_count(), outcomes.failure_count())
            .map_err(|e| {
                RUNS_TOTAL
                    .with_label_values(&[trigger.as_str(), RunStatus::Failed.as_str()])
                    .inc();
                match e {
                    RunError::CountMismatch { .. } => PipelineError::Aborted(e.to_string()),
                    RunError::Store(e) => PipelineError::Persistence(e.to_string()),
                }
            })?;

        Ok(self.finish(record, outcomes))
    }

    /// Mark stale `running` records failed.
    ///
    /// Skipped while a run holds the pipeline. Holding the guard here means no
    /// run of this process is live, so any `running` record is abandoned.
    pub fn sweep_orphans(&self, max_age: chrono::Duration) -> Result<Vec<String>, PipelineError> {
        let Ok(_guard) = self.in_flight.try_lock() else {
            debug!("Run in progress, skipping orphan sweep");
            return Ok(Vec::new());
        };
        self.tracker
            .sweep_orphans(max_age)
            .map_err(|e| PipelineError::Persistence(e.to_string()))
    }

    fn persist(&self, run_id: &str, outcomes: &ScrapeOutcomes) -> Result<(), StoreError> {
        let snapshots = outcomes.successes();
        if !snapshots.is_empty() {
            self.store.save_many(&snapshots)?;
        }

        let failed_at = Utc::now();
        for outcome in outcomes.iter() {
            if let ScrapeOutcome::Failure {
                resort_id,
                error,
                source_url,
            } = outcome
            {
                self.store.save_failure(&FailureRecord {
                    run_id: run_id.to_string(),
                    resort_id: resort_id.clone(),
                    error_kind: error.kind().to_string(),
                    message: error.to_string(),
                    source_url: source_url.clone(),
                    failed_at,
                })?;
            }
        }
        Ok(())
    }

    fn abort(&self, run: ActiveRun, trigger: TriggerSource, err: PipelineError) -> PipelineError {
        let run_id = run.run_id().to_string();
        if let Err(fail_err) = run.fail(err.to_string()) {
            warn!(run_id = %run_id, error = %fail_err, "Could not mark run failed");
        }
        RUNS_TOTAL
            .with_label_values(&[trigger.as_str(), RunStatus::Failed.as_str()])
            .inc();
        err
    }

    fn finish(&self, record: RunRecord, outcomes: ScrapeOutcomes) -> RunReport {
        let successful = record.successful.unwrap_or(0);
        let failed = record.failed.unwrap_or(0);
        let success_rate = record.success_rate().unwrap_or(0.0);

        RUNS_TOTAL
            .with_label_values(&[record.trigger.as_str(), RunStatus::Completed.as_str()])
            .inc();
        RUN_SUCCESS_RATE.set(success_rate);

        let alert = RunAlert::for_run(&record);
        if let Some(alert) = &alert {
            self.alerts.dispatch(alert.clone());
        }

        info!(
            run_id = %record.run_id,
            successful,
            failed,
            success_rate,
            alerted = alert.is_some(),
            "Run finished"
        );

        RunReport {
            message: format!(
                "Scraped {}/{} resorts ({:.1}% success)",
                successful, record.total, success_rate
            ),
            run_id: record.run_id,
            status: record.status,
            trigger: record.trigger,
            batch: record.batch,
            total: record.total,
            successful,
            failed,
            duration_ms: record.duration_ms.unwrap_or(0),
            success_rate,
            health: HealthClass::classify(success_rate),
            outcomes,
            alert,
        }
    }
}
