//! Collection health over trailing windows.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use liftwatch_core::{
    health::DEFAULT_WINDOW_DAYS, store::FailureWithRun, HealthReport, MonitorSummary,
};

use super::error::ApiError;
use crate::state::AppState;

const MAX_WINDOW_DAYS: u32 = 90;
const DEFAULT_FAILURE_LIMIT: usize = 100;

#[derive(Debug, Default, Deserialize)]
pub struct WindowQuery {
    pub days: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FailuresQuery {
    pub days: Option<u32>,
    pub resort_id: Option<String>,
    pub limit: Option<usize>,
}

fn window_days(days: Option<u32>) -> Result<u32, ApiError> {
    match days.unwrap_or(DEFAULT_WINDOW_DAYS) {
        d @ 1..=MAX_WINDOW_DAYS => Ok(d),
        d => Err(ApiError::bad_request(format!(
            "days must be between 1 and {}, got {}",
            MAX_WINDOW_DAYS, d
        ))),
    }
}

pub async fn health(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<HealthReport>, ApiError> {
    let days = window_days(query.days)?;
    Ok(Json(state.evaluator().evaluate(days)?))
}

pub async fn failures(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FailuresQuery>,
) -> Result<Json<Vec<FailureWithRun>>, ApiError> {
    let days = window_days(query.days)?;
    if let Some(resort_id) = query.resort_id.as_deref() {
        state.registry().find(resort_id)?;
    }

    let limit = query.limit.unwrap_or(DEFAULT_FAILURE_LIMIT).max(1);
    Ok(Json(state.evaluator().failures(
        days,
        query.resort_id.as_deref(),
        limit,
    )?))
}

pub async fn summary(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<MonitorSummary>, ApiError> {
    let days = window_days(query.days)?;
    Ok(Json(state.evaluator().summary(days)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_days_defaults_to_a_week() {
        assert_eq!(window_days(None).unwrap(), 7);
        assert_eq!(window_days(Some(30)).unwrap(), 30);
    }

    #[test]
    fn test_window_days_bounds() {
        assert!(window_days(Some(0)).is_err());
        assert!(window_days(Some(91)).is_err());
    }
}
