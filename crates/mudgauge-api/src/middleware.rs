//! Request logging and counting.

use std::time::Instant;

use axum::extract::{MatchedPath, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tracing::info;

use crate::ApiState;

/// Log every request and bump `mudgauge_http_requests{path}`.
///
/// The route pattern is used as the label when one matched, so the gauge
/// cannot grow one series per arbitrary URL.
pub async fn track_requests(State(state): State<ApiState>, req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    let start = Instant::now();

    let resp = next.run(req).await;

    state.requests.add([path.as_str()], 1.0);
    info!(
        %method,
        %path,
        status = resp.status().as_u16(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "request served"
    );
    resp
}
