//! Run history.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use liftwatch_core::{store::RunFilter, RunRecord, RunStatus};

use super::error::ApiError;
use crate::state::AppState;

const MAX_RUNS_LIMIT: usize = 200;

#[derive(Debug, Default, Deserialize)]
pub struct RunsQuery {
    pub status: Option<String>,
    pub limit: Option<usize>,
}

pub async fn list_runs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RunsQuery>,
) -> Result<Json<Vec<RunRecord>>, ApiError> {
    let mut filter = RunFilter::default();
    if let Some(raw) = query.status.as_deref() {
        let status = RunStatus::parse(raw)
            .ok_or_else(|| ApiError::bad_request(format!("unknown run status: {}", raw)))?;
        filter = filter.with_status(status);
    }
    if let Some(limit) = query.limit {
        filter = filter.with_limit(limit.clamp(1, MAX_RUNS_LIMIT));
    }

    Ok(Json(state.store().list_runs(&filter)?))
}

pub async fn get_run(
    State(state): State<Arc<AppState>>,
    Path(run_id): Path<String>,
) -> Result<Json<RunRecord>, ApiError> {
    state
        .store()
        .get_run(&run_id)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("run not found: {}", run_id)))
}
