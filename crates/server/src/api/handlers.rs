use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use liftwatch_core::{orchestrator::SchedulerStatus, SanitizedConfig};

use crate::metrics::{collect_dynamic_metrics, encode_metrics};
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

#[derive(Serialize)]
pub struct SchedulerResponse {
    pub available: bool,
    #[serde(flatten)]
    pub status: Option<SchedulerStatus>,
    pub run_in_progress: bool,
}

pub async fn scheduler_status(State(state): State<Arc<AppState>>) -> Json<SchedulerResponse> {
    Json(SchedulerResponse {
        available: state.scheduler().is_some(),
        status: state.scheduler().map(|s| s.status()),
        run_in_progress: state.pipeline().is_running(),
    })
}

pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    collect_dynamic_metrics(&state);
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}
