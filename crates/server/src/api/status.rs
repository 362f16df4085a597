//! Latest status and per-resort history.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use liftwatch_core::StatusSnapshot;

use super::error::ApiError;
use crate::state::AppState;

const DEFAULT_HISTORY_LIMIT: usize = 50;
const MAX_HISTORY_LIMIT: usize = 500;

/// Latest status for every resort, tagged with the store backend.
#[derive(Debug, Serialize)]
pub struct StatusListResponse {
    pub storage: &'static str,
    pub resorts: Vec<StatusSnapshot>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub storage: &'static str,
    #[serde(flatten)]
    pub status: StatusSnapshot,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

pub async fn list_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatusListResponse>, ApiError> {
    let store = state.store();
    Ok(Json(StatusListResponse {
        storage: store.backend_name(),
        resorts: store.get_all()?,
    }))
}

pub async fn get_status(
    State(state): State<Arc<AppState>>,
    Path(resort_id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    state.registry().find(&resort_id)?;

    let store = state.store();
    let status = store
        .get(&resort_id)?
        .ok_or_else(|| ApiError::not_found(format!("no status recorded for {}", resort_id)))?;
    Ok(Json(StatusResponse {
        storage: store.backend_name(),
        status,
    }))
}

pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Path(resort_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<StatusSnapshot>>, ApiError> {
    state.registry().find(&resort_id)?;

    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);
    Ok(Json(state.store().history(&resort_id, limit)?))
}
