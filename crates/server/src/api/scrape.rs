//! Run trigger handlers. Routed behind `auth_middleware`.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use liftwatch_core::{RunReport, TriggerSource};

use super::error::ApiError;
use super::middleware::TriggeredBy;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct TriggerQuery {
    /// "manual" (default) or "cron" for external schedulers.
    pub trigger: Option<String>,
}

impl TriggerQuery {
    fn source(&self, default: TriggerSource) -> Result<TriggerSource, ApiError> {
        match self.trigger.as_deref() {
            None => Ok(default),
            Some(raw) => TriggerSource::parse(raw)
                .ok_or_else(|| ApiError::bad_request(format!("unknown trigger source: {}", raw))),
        }
    }
}

/// Scrape every resort in the roster.
pub async fn scrape_all(
    State(state): State<Arc<AppState>>,
    TriggeredBy(caller): TriggeredBy,
    Query(query): Query<TriggerQuery>,
) -> Result<Json<RunReport>, ApiError> {
    let trigger = query.source(TriggerSource::Manual)?;
    info!(caller = %caller.id, trigger = %trigger, "Collection run requested");

    let report = state.pipeline().run_all(trigger).await?;
    Ok(Json(report))
}

/// Scrape one batch of the roster.
pub async fn scrape_batch(
    State(state): State<Arc<AppState>>,
    TriggeredBy(caller): TriggeredBy,
    Path(batch): Path<u8>,
    Query(query): Query<TriggerQuery>,
) -> Result<Json<RunReport>, ApiError> {
    let trigger = query.source(TriggerSource::Batch)?;
    info!(caller = %caller.id, batch, trigger = %trigger, "Batch run requested");

    let report = state.pipeline().run_batch(batch, trigger).await?;
    Ok(Json(report))
}
