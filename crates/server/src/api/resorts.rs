use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ResortEntry {
    pub resort_id: String,
    pub name: String,
    pub url: String,
    pub batch: u8,
    pub strategy: &'static str,
}

/// The configured roster, in batch order.
pub async fn list_resorts(State(state): State<Arc<AppState>>) -> Json<Vec<ResortEntry>> {
    let resorts = state
        .registry()
        .all_targets()
        .iter()
        .map(|t| ResortEntry {
            resort_id: t.resort_id.clone(),
            name: t.name.clone(),
            url: t.url.clone(),
            batch: t.batch,
            strategy: t.strategy.tag(),
        })
        .collect();
    Json(resorts)
}
