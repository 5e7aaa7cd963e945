//! Pull-style shop collector.
//!
//! Invoked by `/metrics` scrapes rather than by the scheduler. Walking
//! every shop of every type costs one request per shop, so a collection
//! runs at most once per `min_interval`; scrapes inside that window get an
//! empty batch.

use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use mudgauge_core::{Shop, ShopType};
use mudgauge_fetch::UpstreamClient;
use mudgauge_metrics::{MetricDesc, MetricSample};

const SHOP_LABELS: usize = 41;

/// One `coremud_shops` sample.
pub type ShopSample = MetricSample<SHOP_LABELS>;

/// Every shop attribute is a label; the value is the shop's net gain.
pub const SHOP_DESC: MetricDesc<SHOP_LABELS> = MetricDesc {
    name: "coremud_shops",
    help: "Information about the shops",
    labels: [
        "owner",
        "shop_name",
        "merchant_name",
        "shop_type",
        "repair_income",
        "gerks",
        "max_gerks",
        "total_income",
        "max_lizon",
        "lizon_price",
        "gerks_price",
        "honey_capacity",
        "drinks_sold",
        "honey_inventory",
        "bottle_bounty",
        "backroom_income",
        "food_inventory",
        "recycle_paid",
        "food_paid",
        "honey_bounty",
        "dirty_inventory",
        "yeast_inventory",
        "soap_inventory",
        "bottle_inventory",
        "corpses",
        "regen_cost",
        "limb_bounty",
        "food_cost",
        "bleed_bounty",
        "limbs",
        "bounty_paid",
        "detox_cost",
        "transfuse_cost",
        "corpse_bounty",
        "revive_cost",
        "blood_inventory",
        "bleed_paid",
        "limb_inventory",
        "in_business",
        "forge_wear",
        "rep_wear",
    ],
};

pub struct ShopCollector {
    client: UpstreamClient,
    min_interval: Duration,
    /// Start of the last collection that was allowed to run.
    last_run: Mutex<Option<Instant>>,
}

impl ShopCollector {
    pub fn new(client: UpstreamClient, min_interval: Duration) -> Self {
        Self {
            client,
            min_interval,
            last_run: Mutex::new(None),
        }
    }

    /// Collect a fresh batch, or nothing if the last one is too recent.
    pub async fn collect(&self) -> Vec<ShopSample> {
        self.collect_at(Instant::now()).await
    }

    /// [`collect`](Self::collect) with an explicit clock reading.
    pub async fn collect_at(&self, now: Instant) -> Vec<ShopSample> {
        {
            let mut last_run = self.last_run.lock().await;
            if let Some(prev) = *last_run {
                let elapsed = now.saturating_duration_since(prev);
                if elapsed < self.min_interval {
                    debug!(
                        elapsed_secs = elapsed.as_secs(),
                        min_interval_secs = self.min_interval.as_secs(),
                        "shop collection skipped, ran recently"
                    );
                    return Vec::new();
                }
            }
            *last_run = Some(now);
        }

        let mut samples = Vec::new();
        for shop_type in ShopType::ALL {
            info!(%shop_type, "fetching shops");
            let index = match self.client.fetch_shop_names(shop_type).await {
                Ok(index) => index,
                Err(e) => {
                    warn!(%shop_type, error = %e, "shop index fetch failed, skipping type");
                    continue;
                }
            };

            for name in index.names() {
                debug!(%shop_type, shop = %name, "fetching shop");
                match self.client.fetch_shop(shop_type, name).await {
                    Ok(shop) => samples.push(shop_sample(&shop)),
                    Err(e) => {
                        warn!(%shop_type, shop = %name, error = %e, "shop fetch failed, skipping")
                    }
                }
            }
        }

        info!(shops = samples.len(), "shop collection finished");
        samples
    }
}

/// Build the `coremud_shops` sample for one shop.
pub fn shop_sample(shop: &Shop) -> ShopSample {
    let n = |v: i64| v.to_string();
    SHOP_DESC.sample(
        [
            shop.owner.clone(),
            shop.shop_name.clone(),
            shop.merchant_name.clone(),
            shop.shop_type.clone(),
            n(shop.repair_income),
            n(shop.gerks),
            n(shop.max_gerks),
            n(shop.total_income),
            n(shop.max_lizon),
            n(shop.lizon_price),
            n(shop.gerks_price),
            n(shop.honey_capacity),
            n(shop.drinks_sold),
            n(shop.honey_inventory),
            n(shop.bottle_bounty),
            n(shop.backroom_income),
            n(shop.food_inventory),
            n(shop.recycle_paid),
            n(shop.food_paid),
            n(shop.honey_bounty),
            n(shop.dirty_inventory),
            n(shop.yeast_inventory),
            n(shop.soap_inventory),
            n(shop.bottle_inventory),
            n(shop.corpses),
            n(shop.regen_cost),
            n(shop.limb_bounty),
            n(shop.food_cost),
            n(shop.bleed_bounty),
            n(shop.limbs),
            n(shop.bounty_paid),
            n(shop.detox_cost),
            n(shop.transfuse_cost),
            n(shop.corpse_bounty),
            n(shop.revive_cost),
            n(shop.blood_inventory),
            n(shop.bleed_paid),
            n(shop.limb_inventory),
            shop.in_business.to_string(),
            n(shop.forge_wear),
            n(shop.rep_wear),
        ],
        shop.gain.net_gain as f64,
    )
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use mudgauge_fetch::fake::FakeUpstream;

    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    fn shop_body(owner: &str, net_gain: i64) -> serde_json::Value {
        json!({
            "owner": owner,
            "merchant_name": format!("{owner}'s clerk"),
            "gain": {"pre_gain": net_gain + 10, "net_gain": net_gain},
            "honey_cap": 50,
            "drinks_sold": 7
        })
    }

    fn names(samples: &[ShopSample]) -> Vec<&str> {
        samples
            .iter()
            .map(|s| s.label(&SHOP_DESC, "shop_name").unwrap())
            .collect()
    }

    #[tokio::test]
    async fn empty_names_are_not_fetched() {
        let upstream = FakeUpstream::start().await;
        upstream.json("/shop/pub", json!({"shops": ["", "alice", "bob"]}));
        upstream.json("/shop/pub/alice", shop_body("Alice", 80));
        upstream.json("/shop/pub/bob", shop_body("Bob", 20));
        let collector = ShopCollector::new(upstream.client(), HOUR);

        let samples = collector.collect().await;
        assert_eq!(names(&samples), vec!["alice", "bob"]);
        assert_eq!(upstream.hits("/shop/pub/alice"), 1);
        assert_eq!(upstream.hits("/shop/pub/bob"), 1);
        assert_eq!(upstream.hits("/shop/pub/"), 0);
    }

    #[tokio::test]
    async fn failed_shop_does_not_stop_the_type() {
        let upstream = FakeUpstream::start().await;
        upstream.json("/shop/pub", json!({"shops": ["bob", "alice"]}));
        upstream.status("/shop/pub/bob", 500);
        upstream.json("/shop/pub/alice", shop_body("Alice", 80));
        let collector = ShopCollector::new(upstream.client(), HOUR);

        let samples = collector.collect().await;
        assert_eq!(names(&samples), vec!["alice"]);
        assert_eq!(samples[0].value, 80.0);
    }

    #[tokio::test]
    async fn shop_with_null_fields_is_emitted() {
        let upstream = FakeUpstream::start().await;
        upstream.json("/shop/retail", json!({"shops": ["corner"]}));
        upstream.json(
            "/shop/retail/corner",
            json!({"owner": "Dan", "denylisted": null, "report_cleared": null, "gain": {"pre_gain": 4, "net_gain": 3}}),
        );
        let collector = ShopCollector::new(upstream.client(), HOUR);

        let samples = collector.collect().await;
        assert_eq!(names(&samples), vec!["corner"]);
        assert_eq!(samples[0].label(&SHOP_DESC, "owner"), Some("Dan"));
        assert_eq!(samples[0].value, 3.0);
    }

    #[tokio::test]
    async fn failed_index_does_not_stop_other_types() {
        let upstream = FakeUpstream::start().await;
        upstream.status("/shop/armour", 503);
        upstream.raw("/shop/lizon", "not json");
        upstream.json("/shop/clinic", json!({"shops": ["mend"]}));
        upstream.json("/shop/clinic/mend", shop_body("Carol", -15));
        let collector = ShopCollector::new(upstream.client(), HOUR);

        let samples = collector.collect().await;
        assert_eq!(names(&samples), vec!["mend"]);
        assert_eq!(samples[0].value, -15.0);
        // Every type was still asked for its index, in order.
        for shop_type in ShopType::ALL {
            assert_eq!(upstream.hits(&format!("/shop/{shop_type}")), 1);
        }
    }

    #[tokio::test]
    async fn rate_limited_within_min_interval() {
        let upstream = FakeUpstream::start().await;
        upstream.json("/shop/retail", json!({"shops": ["corner"]}));
        upstream.json("/shop/retail/corner", shop_body("Dan", 5));
        let collector = ShopCollector::new(upstream.client(), HOUR);

        let t0 = Instant::now();
        assert_eq!(collector.collect_at(t0).await.len(), 1);
        let hits_after_first = upstream.total_hits();

        let second = collector.collect_at(t0 + Duration::from_secs(30 * 60)).await;
        assert!(second.is_empty());
        assert_eq!(upstream.total_hits(), hits_after_first);

        let third = collector.collect_at(t0 + HOUR + Duration::from_secs(1)).await;
        assert_eq!(third.len(), 1);
        assert_eq!(upstream.total_hits(), hits_after_first * 2);
    }

    #[tokio::test]
    async fn concurrent_scrape_gets_empty_batch() {
        let upstream = FakeUpstream::start().await;
        upstream.json("/shop/factory", json!({"shops": ["mill"]}));
        upstream.json("/shop/factory/mill", shop_body("Erin", 12));
        let collector = ShopCollector::new(upstream.client(), HOUR);

        let now = Instant::now();
        let (a, b) = tokio::join!(collector.collect_at(now), collector.collect_at(now));
        assert_eq!(a.len() + b.len(), 1);
        assert_eq!(upstream.hits("/shop/factory/mill"), 1);
    }

    #[test]
    fn sample_labels_follow_desc_order() {
        let shop = Shop {
            shop_name: "tavern".to_string(),
            shop_type: "pub".to_string(),
            owner: "Alice".to_string(),
            merchant_name: "Bartleby".to_string(),
            honey_capacity: 40,
            in_business: true,
            rep_wear: 9,
            gain: mudgauge_core::Gain {
                pre_gain: 100,
                net_gain: 75,
            },
            ..Shop::default()
        };

        let sample = shop_sample(&shop);
        assert_eq!(sample.value, 75.0);
        assert_eq!(&sample.labels[..4], &["Alice", "tavern", "Bartleby", "pub"]);
        assert_eq!(sample.label(&SHOP_DESC, "honey_capacity"), Some("40"));
        assert_eq!(sample.label(&SHOP_DESC, "in_business"), Some("true"));
        assert_eq!(sample.label(&SHOP_DESC, "rep_wear"), Some("9"));
        assert_eq!(sample.label(&SHOP_DESC, "corpses"), Some("0"));
    }
}
