//! hangfire-api — HTTP surface of the Hangfire exporter.
//!
//! # Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/` | Landing page linking to the scrape path |
//! | GET | `<metrics_path>` | Prometheus exposition (default `/metrics`) |
//!
//! The scrape endpoint always answers 200; backend health is carried by
//! the `up` metric.

pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use hangfire_metrics::HangfireCollector;

/// Default scrape path.
pub const DEFAULT_METRICS_PATH: &str = "/metrics";

/// Shared state for handlers.
#[derive(Clone)]
pub struct ApiState {
    pub collector: Arc<HangfireCollector>,
    pub metrics_path: Arc<str>,
}

/// Build the router serving the landing page and the scrape endpoint.
pub fn build_router(collector: Arc<HangfireCollector>, metrics_path: &str) -> Router {
    let state = ApiState {
        collector,
        metrics_path: Arc::from(metrics_path),
    };

    Router::new()
        .route("/", get(handlers::landing_page))
        .route(metrics_path, get(handlers::prometheus_metrics))
        .with_state(state)
}
