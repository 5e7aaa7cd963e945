//! HTTP handlers.

use axum::Json;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::{error, warn};

use mudgauge_collector::SHOP_DESC;
use mudgauge_metrics::{TEXT_CONTENT_TYPE, encode_samples};

use crate::ApiState;

pub const BANNER: &str = "mudgauge: CoreMUD market and shop exporter. Metrics at /metrics.\n";

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

/// GET /
pub async fn banner() -> &'static str {
    BANNER
}

/// GET /healthz
pub async fn healthz() -> impl IntoResponse {
    Json(Health { status: "ok" })
}

/// GET /metrics
///
/// Runs the shop collector (subject to its own rate limit) and renders its
/// batch after the current contents of the sink.
pub async fn metrics(State(state): State<ApiState>) -> Response {
    let shop_text = match &state.shops {
        Some(shops) => {
            let samples = shops.collect().await;
            match encode_samples(&SHOP_DESC, &samples) {
                Ok(text) => text,
                Err(e) => {
                    warn!(error = %e, samples = samples.len(), "failed to encode shop samples");
                    String::new()
                }
            }
        }
        None => String::new(),
    };

    match state.sink.render() {
        Ok(mut body) => {
            body.push_str(&shop_text);
            ([(header::CONTENT_TYPE, TEXT_CONTENT_TYPE)], body).into_response()
        }
        Err(e) => {
            error!(error = %e, "failed to render metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
