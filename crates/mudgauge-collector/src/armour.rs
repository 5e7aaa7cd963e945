//! Armour shop publishing.

use std::sync::Arc;

use tracing::debug;

use mudgauge_core::{ArmorShop, ShopIndex};
use mudgauge_fetch::{FetchResult, UpstreamClient};
use mudgauge_metrics::{GaugeSeries, MetricSink, MetricsResult};

/// Publishes the armour shop count and per-shop inventory quantities.
pub struct ArmourJob {
    client: UpstreamClient,
    shop_count: GaugeSeries<0>,
    inventory: GaugeSeries<1>,
}

impl ArmourJob {
    pub fn new(client: UpstreamClient, sink: Arc<dyn MetricSink>) -> MetricsResult<Self> {
        let shop_count = GaugeSeries::register(
            sink.clone(),
            "coremud_armour_shops",
            "Number of armour shops",
            [],
        )?;
        let inventory = GaugeSeries::register(
            sink,
            "shop_inventory",
            "Quantity of armour in stock per shop",
            ["shop"],
        )?;
        Ok(Self {
            client,
            shop_count,
            inventory,
        })
    }

    /// Fetch the armour shop index without publishing anything.
    pub async fn fetch_index(&self) -> FetchResult<ShopIndex> {
        self.client.fetch_armor_shops().await
    }

    /// Fetch the armour shop index and publish the number of shops.
    pub async fn refresh_index(&self) -> FetchResult<ShopIndex> {
        let index = self.fetch_index().await?;
        let count = index.names().count();
        self.shop_count.set([], count as f64);
        debug!(shops = count, "armour shop count published");
        Ok(index)
    }

    /// Fetch every shop in `index` and publish its inventory.
    ///
    /// Returns the shops that were fetched. Shops that failed are skipped.
    pub async fn refresh_inventory(&self, index: &ShopIndex) -> Vec<ArmorShop> {
        let shops = self.client.fetch_armor_shop_inventory(index).await;
        for shop in &shops {
            self.publish_inventory(shop);
        }
        shops
    }

    /// Write a shop's item quantities to `shop_inventory{shop}`.
    ///
    /// The gauge is keyed by shop only, so when a shop lists several items
    /// the last one in name order is what remains.
    pub fn publish_inventory(&self, shop: &ArmorShop) {
        for item in shop.inventory.values() {
            self.inventory.set([shop.name.as_str()], item.quantity as f64);
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use mudgauge_fetch::fake::FakeUpstream;
    use mudgauge_metrics::{PrometheusSink, RecordingSink};

    use super::*;

    fn item(quantity: i64) -> serde_json::Value {
        json!({"price": 15, "type": "body", "armor_class": 4, "material": "leather", "quantity": quantity, "autoflag": false})
    }

    #[tokio::test]
    async fn index_publishes_non_empty_shop_count() {
        let upstream = FakeUpstream::start().await;
        upstream.json("/shop/armour", json!({"shops": ["", "forge", "smithy"]}));
        let sink = Arc::new(RecordingSink::new());
        let job = ArmourJob::new(upstream.client(), sink.clone()).unwrap();

        let index = job.refresh_index().await.unwrap();
        assert_eq!(index.shops.len(), 3);
        assert_eq!(sink.value("coremud_armour_shops", &[]), Some(2.0));
    }

    #[tokio::test]
    async fn last_item_wins_per_shop() {
        let upstream = FakeUpstream::start().await;
        upstream.json("/shop/armour", json!({"shops": ["forge"]}));
        upstream.json(
            "/shop/armour/forge",
            json!({"inventory": {"visor": item(4), "cuirass": item(1)}}),
        );
        let sink = Arc::new(RecordingSink::new());
        let job = ArmourJob::new(upstream.client(), sink.clone()).unwrap();

        let index = job.refresh_index().await.unwrap();
        let shops = job.refresh_inventory(&index).await;
        assert_eq!(shops.len(), 1);

        // cuirass is written first, visor overwrites it.
        let writes = sink.updates_for("shop_inventory");
        assert_eq!(writes.len(), 2);
        assert_eq!(sink.value("shop_inventory", &["forge"]), Some(4.0));
    }

    #[tokio::test]
    async fn vanished_shop_is_left_stale() {
        let upstream = FakeUpstream::start().await;
        upstream.json("/shop/armour", json!({"shops": ["forge", "smithy"]}));
        upstream.json("/shop/armour/forge", json!({"inventory": {"helm": item(3)}}));
        upstream.json("/shop/armour/smithy", json!({"inventory": {"greaves": item(9)}}));
        let sink = PrometheusSink::new();
        let job = ArmourJob::new(upstream.client(), Arc::new(sink.clone())).unwrap();

        let index = job.refresh_index().await.unwrap();
        job.refresh_inventory(&index).await;

        upstream.json("/shop/armour", json!({"shops": ["forge"]}));
        let index = job.refresh_index().await.unwrap();
        job.refresh_inventory(&index).await;

        let output = sink.render().unwrap();
        assert!(output.contains("coremud_armour_shops 1"));
        assert!(output.contains("shop_inventory{shop=\"smithy\"} 9"));
        assert!(output.contains("shop_inventory{shop=\"forge\"} 3"));
    }

    #[tokio::test]
    async fn failed_shop_keeps_previous_inventory() {
        let upstream = FakeUpstream::start().await;
        upstream.json("/shop/armour", json!({"shops": ["forge"]}));
        upstream.json("/shop/armour/forge", json!({"inventory": {"helm": item(3)}}));
        let sink = Arc::new(RecordingSink::new());
        let job = ArmourJob::new(upstream.client(), sink.clone()).unwrap();

        let index = job.refresh_index().await.unwrap();
        job.refresh_inventory(&index).await;

        upstream.raw("/shop/armour/forge", "{\"inventory\": 12}");
        let shops = job.refresh_inventory(&index).await;
        assert!(shops.is_empty());
        assert_eq!(sink.value("shop_inventory", &["forge"]), Some(3.0));
    }
}
