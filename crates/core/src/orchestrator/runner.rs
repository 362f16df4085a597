//! Concurrent fan-out of source adapters with settle-all semantics.
//!
//! Every target gets its own task and its own time bound. A failing, slow or
//! panicking adapter only ever produces a Failure outcome for its own resort.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::adapter::{AdapterError, AdapterRegistry, SourceAdapter};
use crate::metrics::{SCRAPE_ATTEMPTS, SCRAPE_DURATION};
use crate::registry::{BatchSelection, RegistryError, ResortRegistry, ScrapeTarget};

use super::config::OrchestratorConfig;
use super::types::{ScrapeOutcome, ScrapeOutcomes};

/// Drives one adapter per target and assembles the outcome map.
#[derive(Clone)]
pub struct ScrapeOrchestrator {
    registry: Arc<ResortRegistry>,
    adapters: AdapterRegistry,
    config: OrchestratorConfig,
}

impl ScrapeOrchestrator {
    pub fn new(
        registry: Arc<ResortRegistry>,
        adapters: AdapterRegistry,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            registry,
            adapters,
            config,
        }
    }

    pub fn registry(&self) -> &ResortRegistry {
        &self.registry
    }

    /// Scrape every target in the roster.
    pub async fn run_all(&self) -> ScrapeOutcomes {
        let targets = self.registry.all_targets().to_vec();
        self.run_targets(&targets).await
    }

    /// Scrape one batch. Out-of-range batches are rejected before any fetch.
    pub async fn run_batch(&self, batch: u8) -> Result<ScrapeOutcomes, RegistryError> {
        let targets = self.registry.resolve(BatchSelection::Batch(batch))?;
        Ok(self.run_targets(&targets).await)
    }

    /// Launch all targets and wait for every one to settle.
    ///
    /// The result has exactly one outcome per target, in target order.
    pub async fn run_targets(&self, targets: &[ScrapeTarget]) -> ScrapeOutcomes {
        let started = Instant::now();
        let timeout = self.config.adapter_timeout();
        let slots = (self.config.max_concurrency > 0)
            .then(|| Arc::new(Semaphore::new(self.config.max_concurrency)));

        let handles: Vec<_> = targets
            .iter()
            .map(|target| {
                let adapter = self.adapters.get(&target.resort_id);
                let target = target.clone();
                let slots = slots.clone();
                tokio::spawn(async move {
                    let _permit = match slots {
                        Some(slots) => slots.acquire_owned().await.ok(),
                        None => None,
                    };
                    scrape_one(adapter, &target, timeout).await
                })
            })
            .collect();

        let settled = join_all(handles).await;

        let outcomes: Vec<ScrapeOutcome> = targets
            .iter()
            .zip(settled)
            .map(|(target, joined)| match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(resort_id = %target.resort_id, error = %e, "Adapter task aborted");
                    record_attempt(&target.resort_id, "parse", None);
                    ScrapeOutcome::Failure {
                        resort_id: target.resort_id.clone(),
                        error: AdapterError::Parse(format!("adapter task aborted: {}", e)),
                        source_url: target.url.clone(),
                    }
                }
            })
            .collect();

        let outcomes = ScrapeOutcomes::new(outcomes);
        info!(
            targets = targets.len(),
            successful = outcomes.success_count(),
            failed = outcomes.failure_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Fan-out settled"
        );
        outcomes
    }
}

fn record_attempt(resort_id: &str, result: &str, elapsed: Option<Duration>) {
    SCRAPE_ATTEMPTS.with_label_values(&[resort_id, result]).inc();
    if let Some(elapsed) = elapsed {
        SCRAPE_DURATION
            .with_label_values(&[resort_id])
            .observe(elapsed.as_secs_f64());
    }
}

async fn scrape_one(
    adapter: Option<Arc<dyn SourceAdapter>>,
    target: &ScrapeTarget,
    timeout: Duration,
) -> ScrapeOutcome {
    let failure = |error: AdapterError| ScrapeOutcome::Failure {
        resort_id: target.resort_id.clone(),
        error,
        source_url: target.url.clone(),
    };

    let Some(adapter) = adapter else {
        warn!(resort_id = %target.resort_id, "No adapter registered");
        record_attempt(&target.resort_id, "parse", None);
        return failure(AdapterError::Parse(format!(
            "no adapter registered for {}",
            target.resort_id
        )));
    };

    let started = Instant::now();
    let result = match tokio::time::timeout(timeout, adapter.fetch_status(target)).await {
        Ok(result) => result,
        Err(_) => Err(AdapterError::Timeout(timeout.as_millis() as u64)),
    };
    let elapsed = started.elapsed();

    match result {
        Ok(snapshot) => {
            debug!(
                resort_id = %target.resort_id,
                adapter = adapter.name(),
                lifts_open = snapshot.lifts_open,
                elapsed_ms = elapsed.as_millis() as u64,
                "Scrape succeeded"
            );
            record_attempt(&target.resort_id, "success", Some(elapsed));
            ScrapeOutcome::Success(snapshot)
        }
        Err(error) => {
            warn!(
                resort_id = %target.resort_id,
                adapter = adapter.name(),
                error = %error,
                "Scrape failed"
            );
            record_attempt(&target.resort_id, error.kind(), Some(elapsed));
            failure(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures::{roster, roster_targets};
    use crate::testing::MockAdapter;

    fn orchestrator(adapter: Arc<MockAdapter>, config: OrchestratorConfig) -> ScrapeOrchestrator {
        let registry = roster();
        let adapters = AdapterRegistry::uniform(registry.all_targets(), adapter);
        ScrapeOrchestrator::new(Arc::new(registry), adapters, config)
    }

    #[tokio::test]
    async fn test_run_all_one_outcome_per_target_in_order() {
        let adapter = Arc::new(MockAdapter::new());
        let orch = orchestrator(adapter.clone(), OrchestratorConfig::default());

        let outcomes = orch.run_all().await;

        let expected: Vec<String> = roster_targets().into_iter().map(|t| t.resort_id).collect();
        assert_eq!(outcomes.resort_ids(), expected);
        assert_eq!(outcomes.success_count(), 15);
        assert_eq!(adapter.call_count(), 15);
    }

    #[tokio::test]
    async fn test_failures_are_isolated() {
        let adapter = Arc::new(
            MockAdapter::new()
                .fail("r02", AdapterError::Parse("layout changed".to_string()))
                .fail("r07", AdapterError::Network("HTTP 503".to_string())),
        );
        let orch = orchestrator(adapter, OrchestratorConfig::default());

        let outcomes = orch.run_all().await;
        assert_eq!(outcomes.len(), 15);
        assert_eq!(outcomes.failure_count(), 2);
        assert!(matches!(
            outcomes.get("r02"),
            Some(ScrapeOutcome::Failure {
                error: AdapterError::Parse(_),
                ..
            })
        ));
        assert!(outcomes.get("r03").is_some_and(|o| o.is_success()));
    }

    #[tokio::test]
    async fn test_slow_adapter_times_out_without_blocking_siblings() {
        let adapter = Arc::new(MockAdapter::new().delay("r05", Duration::from_secs(30)));
        let config = OrchestratorConfig {
            adapter_timeout_ms: 100,
            max_concurrency: 0,
        };
        let orch = orchestrator(adapter, config);

        let started = Instant::now();
        let outcomes = orch.run_all().await;
        assert!(started.elapsed() < Duration::from_secs(5));

        assert!(matches!(
            outcomes.get("r05"),
            Some(ScrapeOutcome::Failure {
                error: AdapterError::Timeout(100),
                ..
            })
        ));
        assert_eq!(outcomes.success_count(), 14);
    }

    #[tokio::test]
    async fn test_panicking_adapter_becomes_failure() {
        let adapter = Arc::new(MockAdapter::new().panic_on("r09"));
        let orch = orchestrator(adapter, OrchestratorConfig::default());

        let outcomes = orch.run_all().await;
        assert_eq!(outcomes.len(), 15);
        assert!(outcomes.get("r09").is_some_and(|o| !o.is_success()));
        assert_eq!(outcomes.success_count(), 14);
    }

    #[tokio::test]
    async fn test_bounded_pool_preserves_settle_all() {
        let adapter = Arc::new(
            MockAdapter::new()
                .fail("r01", AdapterError::Network("refused".to_string()))
                .delay("r02", Duration::from_millis(20)),
        );
        let config = OrchestratorConfig {
            adapter_timeout_ms: 5_000,
            max_concurrency: 2,
        };
        let orch = orchestrator(adapter.clone(), config);

        let outcomes = orch.run_all().await;
        assert_eq!(outcomes.len(), 15);
        assert_eq!(outcomes.failure_count(), 1);
        assert_eq!(adapter.call_count(), 15);
        assert!(adapter.max_in_flight() <= 2);
    }

    #[tokio::test]
    async fn test_run_batch_scrapes_only_that_batch() {
        let adapter = Arc::new(MockAdapter::new());
        let orch = orchestrator(adapter.clone(), OrchestratorConfig::default());

        let outcomes = orch.run_batch(2).await.unwrap();
        assert_eq!(outcomes.resort_ids(), vec!["r06", "r07", "r08", "r09", "r10"]);
        assert_eq!(adapter.call_count(), 5);
    }

    #[tokio::test]
    async fn test_run_batch_out_of_range_rejected_before_fetch() {
        let adapter = Arc::new(MockAdapter::new());
        let orch = orchestrator(adapter.clone(), OrchestratorConfig::default());

        for batch in [0, 4] {
            let result = orch.run_batch(batch).await;
            assert!(matches!(result, Err(RegistryError::InvalidBatch { .. })));
        }
        assert_eq!(adapter.call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_adapter_is_failure_outcome() {
        let registry = Arc::new(roster());
        let orch = ScrapeOrchestrator::new(
            registry,
            AdapterRegistry::new(),
            OrchestratorConfig::default(),
        );
        let outcomes = orch.run_batch(1).await.unwrap();
        assert_eq!(outcomes.len(), 5);
        assert_eq!(outcomes.failure_count(), 5);
    }
}
