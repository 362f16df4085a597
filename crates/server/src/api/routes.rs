use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::middleware::{auth_middleware, metrics_middleware};
use super::{handlers, monitor, resorts, runs, scrape, status};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let trigger_routes = Router::new()
        .route("/scrape", post(scrape::scrape_all))
        .route("/scrape/batch/{batch}", post(scrape::scrape_batch))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            auth_middleware,
        ));

    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/scheduler", get(handlers::scheduler_status))
        .route("/resorts", get(resorts::list_resorts))
        .route("/status", get(status::list_status))
        .route("/status/{resort_id}", get(status::get_status))
        .route("/status/{resort_id}/history", get(status::get_history))
        .route("/runs", get(runs::list_runs))
        .route("/runs/{run_id}", get(runs::get_run))
        .route("/monitor/health", get(monitor::health))
        .route("/monitor/failures", get(monitor::failures))
        .route("/monitor/summary", get(monitor::summary))
        .merge(trigger_routes);

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
