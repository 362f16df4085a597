//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Scrapes (per-resort attempts and latency)
//! - Runs (outcome by trigger, last success rate)
//! - Alerts (delivery by severity)

use once_cell::sync::Lazy;
use prometheus::{Gauge, HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Scrape Metrics
// =============================================================================

/// Scrape attempts total by resort and result.
pub static SCRAPE_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "liftwatch_scrape_attempts_total",
            "Total per-resort scrape attempts",
        ),
        &["resort", "result"], // result: "success", "network", "parse", "timeout"
    )
    .unwrap()
});

/// Scrape duration in seconds.
pub static SCRAPE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "liftwatch_scrape_duration_seconds",
            "Duration of one adapter invocation",
        )
        .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 15.0, 30.0]),
        &["resort"],
    )
    .unwrap()
});

// =============================================================================
// Run Metrics
// =============================================================================

/// Runs total by trigger and terminal status.
pub static RUNS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("liftwatch_runs_total", "Total collection runs"),
        &["trigger", "status"], // status: "completed", "failed"
    )
    .unwrap()
});

/// Success rate of the most recent completed run.
pub static RUN_SUCCESS_RATE: Lazy<Gauge> = Lazy::new(|| {
    Gauge::new(
        "liftwatch_run_success_rate",
        "Success rate (percent) of the last completed run",
    )
    .unwrap()
});

// =============================================================================
// Alert Metrics
// =============================================================================

/// Alerts total by severity and delivery result.
pub static ALERTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("liftwatch_alerts_total", "Total alert deliveries"),
        &["severity", "result"], // result: "delivered", "failed", "dropped"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(SCRAPE_ATTEMPTS.clone()),
        Box::new(SCRAPE_DURATION.clone()),
        Box::new(RUNS_TOTAL.clone()),
        Box::new(RUN_SUCCESS_RATE.clone()),
        Box::new(ALERTS_TOTAL.clone()),
    ]
}
