//! Shared HTTP client for the upstream API.

use reqwest::Url;
use serde::de::DeserializeOwned;
use tracing::debug;

use mudgauge_core::ExporterConfig;

use crate::error::{FetchError, FetchResult};

const USER_AGENT: &str = concat!("mudgauge/", env!("CARGO_PKG_VERSION"));

/// HTTP client bound to one upstream base URL.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    base: Url,
    http: reqwest::Client,
}

impl UpstreamClient {
    /// Build a client from the exporter config.
    pub fn new(config: &ExporterConfig) -> FetchResult<Self> {
        let base_str = config.api_base_url.trim();
        let base = Url::parse(base_str)
            .map_err(|e| FetchError::Url(format!("{base_str}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(FetchError::Url(format!("{base_str}: cannot be a base url")));
        }

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(FetchError::Client)?;

        debug!(
            base = %base,
            timeout_ms = config.request_timeout.as_millis() as u64,
            "upstream client created"
        );
        Ok(Self { base, http })
    }

    /// The configured API root.
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Append percent-encoded path segments to the base URL.
    pub fn endpoint(&self, segments: &[&str]) -> FetchResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::Url(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// GET `url` and decode the body as JSON.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: Url) -> FetchResult<T> {
        debug!(%url, "upstream GET");

        let resp = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = resp.bytes().await.map_err(|source| FetchError::Transport {
            url: url.to_string(),
            source,
        })?;

        serde_json::from_slice(&body).map_err(|source| FetchError::Decode {
            url: url.to_string(),
            source,
        })
    }
}
