//! mudgauge-api — HTTP surface of the exporter.
//!
//! # Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/` | Static banner |
//! | GET | `/healthz` | Liveness, `{"status":"ok"}` |
//! | GET | `/metrics` | Prometheus exposition |
//!
//! Every route is wrapped by [`middleware::track_requests`], which logs the
//! request and bumps `mudgauge_http_requests{path}`.
//!
//! Health and metrics can be served from one listener ([`build_router`])
//! or split across two ([`health_router`] and [`metrics_router`]).

pub mod handlers;
pub mod middleware;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;

use mudgauge_collector::ShopCollector;
use mudgauge_metrics::{GaugeSeries, MetricSink, MetricsResult};

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub sink: Arc<dyn MetricSink>,
    /// Pull collector run on every `/metrics` scrape, if enabled.
    pub shops: Option<Arc<ShopCollector>>,
    requests: GaugeSeries<1>,
}

impl ApiState {
    /// Build handler state and register the request gauge on `sink`.
    pub fn new(
        sink: Arc<dyn MetricSink>,
        shops: Option<Arc<ShopCollector>>,
    ) -> MetricsResult<Self> {
        let requests = GaugeSeries::register(
            sink.clone(),
            "mudgauge_http_requests",
            "Number of HTTP requests served, by path",
            ["path"],
        )?;
        Ok(Self {
            sink,
            shops,
            requests,
        })
    }
}

/// Banner, health, and metrics on one router.
pub fn build_router(state: ApiState) -> Router {
    health_router(state.clone()).merge(metrics_router(state))
}

/// `/` and `/healthz`.
pub fn health_router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(handlers::banner))
        .route("/healthz", get(handlers::healthz))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::track_requests,
        ))
}

/// `/metrics` only.
pub fn metrics_router(state: ApiState) -> Router {
    Router::new()
        .route("/metrics", get(handlers::metrics))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::track_requests,
        ))
        .with_state(state)
}
