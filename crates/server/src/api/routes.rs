use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{handlers, jobs, middleware::metrics_middleware, series};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Config and status
        .route("/config", get(handlers::get_config))
        .route("/status", get(handlers::get_status))
        .route("/stats", get(handlers::get_stats))
        // Tracked series
        .route("/series", post(series::add_series))
        .route("/series", get(series::list_series))
        .route("/series/{id}", get(series::get_series))
        .route("/series/{id}", delete(series::remove_series))
        // Queue
        .route("/jobs", get(jobs::list_jobs))
        .with_state(Arc::clone(&state));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .with_state(state)
        .nest("/api/v1", api_routes)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
}
