//! In-process fake of the upstream API for tests.
//!
//! Serves canned replies per request path on `127.0.0.1:0` and counts
//! every request it receives, including ones for unknown paths (404).

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use tokio::task::JoinHandle;

use mudgauge_core::ExporterConfig;

use crate::client::UpstreamClient;

#[derive(Clone)]
struct Reply {
    status: StatusCode,
    body: String,
}

#[derive(Default)]
struct Shared {
    routes: Mutex<HashMap<String, Reply>>,
    hits: Mutex<HashMap<String, usize>>,
}

/// A running fake upstream. The server stops when this is dropped.
pub struct FakeUpstream {
    addr: SocketAddr,
    shared: Arc<Shared>,
    handle: JoinHandle<()>,
}

impl FakeUpstream {
    /// Bind to an ephemeral port and start serving.
    pub async fn start() -> Self {
        let shared = Arc::new(Shared::default());
        let router = Router::new().fallback(serve).with_state(shared.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake upstream");
        let addr = listener.local_addr().expect("fake upstream address");

        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        Self {
            addr,
            shared,
            handle,
        }
    }

    /// Base URL to point an exporter at.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Default exporter config aimed at this server.
    pub fn config(&self) -> ExporterConfig {
        ExporterConfig::with_base_url(self.base_url())
    }

    /// Upstream client aimed at this server.
    pub fn client(&self) -> UpstreamClient {
        UpstreamClient::new(&self.config()).expect("fake upstream client")
    }

    /// Serve `value` as JSON on `path`.
    pub fn json(&self, path: &str, value: serde_json::Value) {
        self.reply(path, StatusCode::OK, value.to_string());
    }

    /// Serve a raw body with status 200 on `path`.
    pub fn raw(&self, path: &str, body: &str) {
        self.reply(path, StatusCode::OK, body.to_string());
    }

    /// Answer `path` with an empty body and the given status.
    pub fn status(&self, path: &str, code: u16) {
        let status = StatusCode::from_u16(code).expect("valid status code");
        self.reply(path, status, String::new());
    }

    /// Requests received for `path`.
    pub fn hits(&self, path: &str) -> usize {
        self.shared.hits.lock().unwrap().get(path).copied().unwrap_or(0)
    }

    /// Requests received for any path.
    pub fn total_hits(&self) -> usize {
        self.shared.hits.lock().unwrap().values().sum()
    }

    fn reply(&self, path: &str, status: StatusCode, body: String) {
        self.shared
            .routes
            .lock()
            .unwrap()
            .insert(path.to_string(), Reply { status, body });
    }
}

impl Drop for FakeUpstream {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn serve(State(shared): State<Arc<Shared>>, uri: Uri) -> Response {
    let path = uri.path().to_string();
    *shared.hits.lock().unwrap().entry(path.clone()).or_default() += 1;

    let reply = shared.routes.lock().unwrap().get(&path).cloned();
    match reply {
        Some(reply) => (
            reply.status,
            [(header::CONTENT_TYPE, "application/json")],
            reply.body,
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
