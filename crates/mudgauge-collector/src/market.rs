//! Market publishing.

use std::sync::Arc;

use tracing::debug;

use mudgauge_core::Market;
use mudgauge_fetch::{FetchResult, UpstreamClient};
use mudgauge_metrics::{GaugeSeries, MetricSink, MetricsResult};

/// Fetches `/stocks` and publishes one price and one change gauge per
/// commodity.
pub struct MarketJob {
    client: UpstreamClient,
    price: GaugeSeries<2>,
    change: GaugeSeries<2>,
}

impl MarketJob {
    /// Register the commodity gauges on `sink`.
    pub fn new(client: UpstreamClient, sink: Arc<dyn MetricSink>) -> MetricsResult<Self> {
        let price = GaugeSeries::register(
            sink.clone(),
            "commodity_price",
            "The current price of a commodity",
            ["commodity", "type"],
        )?;
        let change = GaugeSeries::register(
            sink,
            "commodity_change",
            "The current change of a commodity",
            ["commodity", "type"],
        )?;
        Ok(Self {
            client,
            price,
            change,
        })
    }

    /// Fetch the market and publish it.
    ///
    /// On error nothing is published and the previous values stay.
    pub async fn refresh(&self) -> FetchResult<Market> {
        let market = self.client.fetch_market().await?;
        self.publish(&market);
        Ok(market)
    }

    /// Write every quote of `market` to the commodity gauges.
    pub fn publish(&self, market: &Market) {
        for (name, kind, quote) in market.quotes() {
            self.price.set([name, kind.as_str()], quote.price);
            self.change.set([name, kind.as_str()], quote.change);
        }
        debug!(
            stocks = market.stocks.len(),
            metals = market.metals.len(),
            "market published"
        );
    }
}
