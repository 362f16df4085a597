use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::HealthClass;
use crate::run::RunRecord;
use crate::store::{
    FailureFilter, FailureWithRun, ResortFailureCount, RunFilter, RunStats, StatusStore,
    StoreError,
};

/// Health over a trailing window of completed runs.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthClass,
    pub success_rate: f64,
    pub window_days: u32,
    #[serde(flatten)]
    pub stats: RunStats,
    pub evaluated_at: DateTime<Utc>,
}

/// Everything a dashboard needs in one read.
#[derive(Debug, Clone, Serialize)]
pub struct MonitorSummary {
    pub storage: &'static str,
    pub health: HealthReport,
    pub recent_runs: Vec<RunRecord>,
    pub recent_failures: Vec<FailureWithRun>,
    pub failure_counts: Vec<ResortFailureCount>,
}

#[derive(Clone)]
pub struct HealthEvaluator {
    store: Arc<dyn StatusStore>,
}

impl HealthEvaluator {
    pub fn new(store: Arc<dyn StatusStore>) -> Self {
        Self { store }
    }

    fn window_start(window_days: u32) -> DateTime<Utc> {
        Utc::now() - Duration::days(i64::from(window_days))
    }

    /// Classify the trailing `window_days`. An empty window is unhealthy.
    pub fn evaluate(&self, window_days: u32) -> Result<HealthReport, StoreError> {
        let stats = self.store.get_stats(Self::window_start(window_days))?;
        let success_rate = stats.success_rate();
        Ok(HealthReport {
            status: HealthClass::classify(success_rate),
            success_rate,
            window_days,
            stats,
            evaluated_at: Utc::now(),
        })
    }

    /// Failures in the trailing window, optionally for one resort.
    pub fn failures(
        &self,
        window_days: u32,
        resort_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<FailureWithRun>, StoreError> {
        let mut filter = FailureFilter::since(Self::window_start(window_days)).with_limit(limit);
        if let Some(resort_id) = resort_id {
            filter = filter.with_resort(resort_id);
        }
        self.store.recent_failures(&filter)
    }

    pub fn summary(&self, window_days: u32) -> Result<MonitorSummary, StoreError> {
        let since = Self::window_start(window_days);
        Ok(MonitorSummary {
            storage: self.store.backend_name(),
            health: self.evaluate(window_days)?,
            recent_runs: self
                .store
                .list_runs(&RunFilter::default().with_limit(10))?,
            recent_failures: self
                .store
                .recent_failures(&FailureFilter::since(since).with_limit(20))?,
            failure_counts: self.store.failure_counts(since)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStatusStore;
    use crate::testing::fixtures::completed_run;

    fn evaluator() -> (HealthEvaluator, Arc<MemoryStatusStore>) {
        let store = Arc::new(MemoryStatusStore::new());
        (HealthEvaluator::new(store.clone()), store)
    }

    #[test]
    fn test_empty_window_is_unhealthy() {
        let (evaluator, _) = evaluator();
        let report = evaluator.evaluate(7).unwrap();
        assert_eq!(report.status, HealthClass::Unhealthy);
        assert_eq!(report.success_rate, 0.0);
        assert_eq!(report.stats.run_count, 0);
    }

    #[test]
    fn test_window_at_exactly_eighty_is_healthy() {
        let (evaluator, store) = evaluator();
        completed_run(store.as_ref(), 15, 12, 3);
        let report = evaluator.evaluate(7).unwrap();
        assert_eq!(report.success_rate, 80.0);
        assert_eq!(report.status, HealthClass::Healthy);
    }

    #[test]
    fn test_window_averages_across_runs() {
        let (evaluator, store) = evaluator();
        completed_run(store.as_ref(), 10, 10, 0);
        completed_run(store.as_ref(), 10, 0, 10);
        let report = evaluator.evaluate(7).unwrap();
        assert_eq!(report.success_rate, 50.0);
        assert_eq!(report.status, HealthClass::Degraded);
        assert_eq!(report.stats.run_count, 2);
    }

    #[test]
    fn test_report_serializes_flat_stats() {
        let (evaluator, store) = evaluator();
        completed_run(store.as_ref(), 15, 15, 0);
        let json = serde_json::to_value(evaluator.evaluate(7).unwrap()).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["run_count"], 1);
        assert_eq!(json["window_days"], 7);
    }

    #[test]
    fn test_summary_reports_backend() {
        let (evaluator, store) = evaluator();
        completed_run(store.as_ref(), 15, 15, 0);
        let summary = evaluator.summary(7).unwrap();
        assert_eq!(summary.storage, "memory");
        assert_eq!(summary.recent_runs.len(), 1);
        assert!(summary.recent_failures.is_empty());
    }
}
