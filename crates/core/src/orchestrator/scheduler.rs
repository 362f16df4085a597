//! Periodic collection runs.
//!
//! Each tick first sweeps orphaned runs, then triggers either the full roster
//! or the next batch in rotation.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::config::{ScheduleMode, SchedulerConfig};
use crate::registry::BatchSelection;
use crate::run::TriggerSource;

use super::pipeline::CollectionPipeline;
use super::types::{PipelineError, RunReport, SchedulerStatus};

/// Selection and trigger for the `tick`-th scheduled run (0-based).
pub fn scheduled_selection(
    mode: ScheduleMode,
    tick: usize,
    batch_count: u8,
) -> (BatchSelection, TriggerSource) {
    match mode {
        ScheduleMode::All => (BatchSelection::All, TriggerSource::Cron),
        ScheduleMode::RotateBatches => {
            let batch = (tick % usize::from(batch_count.max(1))) as u8 + 1;
            (BatchSelection::Batch(batch), TriggerSource::Batch)
        }
    }
}

pub struct Scheduler {
    pipeline: Arc<CollectionPipeline>,
    config: SchedulerConfig,
    running: Arc<AtomicBool>,
    ticks: Arc<AtomicUsize>,
    shutdown_tx: broadcast::Sender<()>,
}

impl Scheduler {
    pub fn new(pipeline: Arc<CollectionPipeline>, config: SchedulerConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            pipeline,
            config,
            running: Arc::new(AtomicBool::new(false)),
            ticks: Arc::new(AtomicUsize::new(0)),
            shutdown_tx,
        }
    }

    /// Start the scheduler (spawns the background loop).
    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Scheduler already running");
            return;
        }

        let pipeline = Arc::clone(&self.pipeline);
        let config = self.config.clone();
        let running = Arc::clone(&self.running);
        let ticks = Arc::clone(&self.ticks);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        info!(
            interval_secs = config.interval_secs,
            mode = ?config.mode,
            "Scheduler started"
        );

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Scheduler received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(Duration::from_secs(config.interval_secs)) => {
                        if !running.load(Ordering::Relaxed) {
                            break;
                        }
                        let _ = run_tick(&pipeline, &config, &ticks).await;
                    }
                }
            }
            info!("Scheduler stopped");
        });
    }

    /// Stop the scheduler. A run already in progress finishes on its own.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        let _ = self.shutdown_tx.send(());
    }

    /// Run one scheduled tick immediately.
    pub async fn tick(&self) -> Result<RunReport, PipelineError> {
        run_tick(&self.pipeline, &self.config, &self.ticks).await
    }

    pub fn status(&self) -> SchedulerStatus {
        let next_batch = match self.config.mode {
            ScheduleMode::All => None,
            ScheduleMode::RotateBatches => scheduled_selection(
                self.config.mode,
                self.ticks.load(Ordering::Relaxed),
                self.pipeline.registry().batch_count(),
            )
            .0
            .batch_number(),
        };
        SchedulerStatus {
            running: self.running.load(Ordering::Relaxed),
            interval_secs: self.config.interval_secs,
            mode: self.config.mode,
            next_batch,
        }
    }
}

async fn run_tick(
    pipeline: &CollectionPipeline,
    config: &SchedulerConfig,
    ticks: &AtomicUsize,
) -> Result<RunReport, PipelineError> {
    match config.orphan_after() {
        Some(max_age) => {
            if let Err(e) = pipeline.sweep_orphans(max_age) {
                warn!(error = %e, "Orphan sweep failed");
            }
        }
        None => warn!(
            orphan_after_secs = config.orphan_after_secs,
            "Orphan age out of range, skipping sweep"
        ),
    }

    let tick = ticks.fetch_add(1, Ordering::Relaxed);
    let (selection, trigger) =
        scheduled_selection(config.mode, tick, pipeline.registry().batch_count());

    let result = pipeline.execute(selection, trigger).await;
    match &result {
        Ok(report) => info!(
            run_id = %report.run_id,
            selection = %selection,
            success_rate = report.success_rate,
            "Scheduled run finished"
        ),
        Err(PipelineError::RunInProgress) => {
            info!(selection = %selection, "Skipping scheduled run, another run is in progress")
        }
        Err(e) => warn!(selection = %selection, error = %e, "Scheduled run failed"),
    }
    result
}
