//! Market fetcher.

use mudgauge_core::Market;

use crate::client::UpstreamClient;
use crate::error::FetchResult;

impl UpstreamClient {
    /// Fetch the current market snapshot from `/stocks`.
    pub async fn fetch_market(&self) -> FetchResult<Market> {
        let url = self.endpoint(&["stocks"])?;
        self.get_json(url).await
    }
}
