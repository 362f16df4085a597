//! Prometheus metrics for the HTTP surface.
//!
//! Request metrics are recorded by middleware; scheduler and run state are
//! sampled when `/metrics` is scraped. Collection metrics live in
//! `liftwatch_core::metrics` and are registered here.

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use regex_lite::Regex;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "liftwatch_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("liftwatch_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "liftwatch_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

/// Rejected trigger requests by reason.
pub static AUTH_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "liftwatch_auth_failures_total",
            "Total authentication failures",
        ),
        &["reason"],
    )
    .unwrap()
});

/// 1 while the background scheduler loop is active.
pub static SCHEDULER_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "liftwatch_scheduler_running",
        "Whether the scheduler is running (1) or stopped (0)",
    )
    .unwrap()
});

/// 1 while a collection run holds the pipeline.
pub static RUN_IN_PROGRESS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "liftwatch_run_in_progress",
        "Whether a collection run is currently executing",
    )
    .unwrap()
});

static UUID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}")
        .unwrap()
});
static NUMERIC_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"/\d+(/|$)").unwrap());
static RESORT_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(/api/v1/status/)[^/]+").unwrap());

fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();
    registry
        .register(Box::new(AUTH_FAILURES_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(SCHEDULER_RUNNING.clone()))
        .unwrap();
    registry
        .register(Box::new(RUN_IN_PROGRESS.clone()))
        .unwrap();

    for metric in liftwatch_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Sample gauges that reflect current state rather than events.
pub fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let scheduler_running = state
        .scheduler()
        .map(|s| s.status().running)
        .unwrap_or(false);
    SCHEDULER_RUNNING.set(i64::from(scheduler_running));
    RUN_IN_PROGRESS.set(i64::from(state.pipeline().is_running()));
}

/// Normalize a path for metric labels (run ids, batch numbers and resort ids
/// become placeholders).
pub fn normalize_path(path: &str) -> String {
    let result = UUID.replace_all(path, "{id}");
    let result = NUMERIC_SEGMENT.replace_all(&result, "/{n}$1");
    let result = RESORT_SEGMENT.replace(&result, "${1}{resort_id}");
    result.into_owned()
}
