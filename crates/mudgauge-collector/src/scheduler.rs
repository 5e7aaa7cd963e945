//! Background poll-and-publish loop.
//!
//! Runs the configured steps once per tick, in order. A failing step is
//! logged and the tick moves on to the next one; a failing upstream is
//! simply retried on the next tick, with no backoff.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use mudgauge_core::{ExporterConfig, PollStep, ShopIndex};
use mudgauge_fetch::UpstreamClient;
use mudgauge_metrics::{MetricSink, MetricsResult};

use crate::armour::ArmourJob;
use crate::market::MarketJob;

/// Outcome of one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub succeeded: Vec<PollStep>,
    pub failed: Vec<PollStep>,
}

impl CycleReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Periodically refreshes the push-style gauges.
pub struct Scheduler {
    steps: Vec<PollStep>,
    interval: Duration,
    market: MarketJob,
    armour: ArmourJob,
}

impl Scheduler {
    /// Build the scheduler and register its gauges on `sink`.
    pub fn new(
        client: UpstreamClient,
        sink: Arc<dyn MetricSink>,
        config: &ExporterConfig,
    ) -> MetricsResult<Self> {
        Ok(Self {
            steps: config.steps.clone(),
            interval: config.poll_interval,
            market: MarketJob::new(client.clone(), sink.clone())?,
            armour: ArmourJob::new(client, sink)?,
        })
    }

    pub fn steps(&self) -> &[PollStep] {
        &self.steps
    }

    /// Run every configured step once.
    pub async fn run_once(&self) -> CycleReport {
        let mut report = CycleReport::default();
        // Index fetched by the armour-shops step, reused by armour-inventory.
        let mut armour_index: Option<ShopIndex> = None;

        for &step in &self.steps {
            let ok = match step {
                PollStep::Market => match self.market.refresh().await {
                    Ok(_) => true,
                    Err(e) => {
                        warn!(%step, error = %e, "market refresh failed");
                        false
                    }
                },
                PollStep::ArmourShops => match self.armour.refresh_index().await {
                    Ok(index) => {
                        armour_index = Some(index);
                        true
                    }
                    Err(e) => {
                        warn!(%step, error = %e, "armour shop index refresh failed");
                        false
                    }
                },
                PollStep::ArmourInventory => {
                    let index = match armour_index.take() {
                        Some(index) => Ok(index),
                        None => self.armour.fetch_index().await,
                    };
                    match index {
                        Ok(index) => {
                            let shops = self.armour.refresh_inventory(&index).await;
                            debug!(%step, shops = shops.len(), "armour inventory published");
                            true
                        }
                        Err(e) => {
                            warn!(%step, error = %e, "armour inventory refresh failed");
                            false
                        }
                    }
                }
            };

            if ok {
                report.succeeded.push(step);
            } else {
                report.failed.push(step);
            }
        }

        report
    }

    /// Run the poll loop until shutdown signal.
    ///
    /// The first tick fires immediately. A tick that overruns the interval
    /// delays the next one rather than bursting.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_secs = self.interval.as_secs(),
            steps = ?self.steps,
            "scheduler started"
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let report = self.run_once().await;
                    if report.is_clean() {
                        debug!(steps = report.succeeded.len(), "poll cycle complete");
                    } else {
                        warn!(failed = ?report.failed, "poll cycle completed with failures");
                    }
                }
                _ = shutdown.changed() => {
                    info!("scheduler shutting down");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use mudgauge_fetch::fake::FakeUpstream;
    use mudgauge_metrics::{PrometheusSink, RecordingSink};

    use super::*;

    fn seed(upstream: &FakeUpstream) {
        upstream.json(
            "/stocks",
            json!({
                "stocks": {"acme": {"price": 10.0, "change": 0.5}},
                "metals": {"gold": {"price": 410.0, "change": 3.0}}
            }),
        );
        upstream.json("/shop/armour", json!({"shops": ["forge", ""]}));
        upstream.json(
            "/shop/armour/forge",
            json!({"inventory": {"helm": {"price": 20, "type": "head", "armor_class": 2, "material": "iron", "quantity": 6, "autoflag": false}}}),
        );
    }

    fn scheduler(
        upstream: &FakeUpstream,
        sink: Arc<dyn MetricSink>,
        config: &ExporterConfig,
    ) -> Scheduler {
        Scheduler::new(upstream.client(), sink, config).unwrap()
    }

    #[tokio::test]
    async fn run_once_runs_every_step() {
        let upstream = FakeUpstream::start().await;
        seed(&upstream);
        let sink = Arc::new(RecordingSink::new());
        let s = scheduler(&upstream, sink.clone(), &upstream.config());

        let report = s.run_once().await;
        assert!(report.is_clean());
        assert_eq!(report.succeeded, PollStep::ALL.to_vec());

        assert_eq!(sink.value("commodity_price", &["gold", "metal"]), Some(410.0));
        assert_eq!(sink.value("coremud_armour_shops", &[]), Some(1.0));
        assert_eq!(sink.value("shop_inventory", &["forge"]), Some(6.0));
        // The inventory step reused the index from the index step.
        assert_eq!(upstream.hits("/shop/armour"), 1);
    }

    #[tokio::test]
    async fn failed_step_does_not_block_later_steps() {
        let upstream = FakeUpstream::start().await;
        seed(&upstream);
        upstream.status("/stocks", 500);
        let sink = Arc::new(RecordingSink::new());
        let s = scheduler(&upstream, sink.clone(), &upstream.config());

        let report = s.run_once().await;
        assert_eq!(report.failed, vec![PollStep::Market]);
        assert_eq!(
            report.succeeded,
            vec![PollStep::ArmourShops, PollStep::ArmourInventory]
        );
        assert_eq!(sink.series_len("commodity_price"), 0);
        assert_eq!(sink.value("shop_inventory", &["forge"]), Some(6.0));
    }

    #[tokio::test]
    async fn inventory_step_fetches_its_own_index() {
        let upstream = FakeUpstream::start().await;
        seed(&upstream);
        let config = ExporterConfig {
            steps: vec![PollStep::ArmourInventory],
            ..upstream.config()
        };
        let sink = Arc::new(RecordingSink::new());
        let s = scheduler(&upstream, sink.clone(), &config);

        let report = s.run_once().await;
        assert!(report.is_clean());
        assert_eq!(upstream.hits("/shop/armour"), 1);
        assert_eq!(upstream.hits("/stocks"), 0);
        // The count gauge belongs to the armour-shops step only.
        assert_eq!(sink.value("coremud_armour_shops", &[]), None);
        assert_eq!(sink.value("shop_inventory", &["forge"]), Some(6.0));
    }

    #[tokio::test]
    async fn failed_index_fails_inventory_too() {
        let upstream = FakeUpstream::start().await;
        seed(&upstream);
        upstream.status("/shop/armour", 503);
        let sink = Arc::new(RecordingSink::new());
        let s = scheduler(&upstream, sink, &upstream.config());

        let report = s.run_once().await;
        assert_eq!(report.succeeded, vec![PollStep::Market]);
        assert_eq!(
            report.failed,
            vec![PollStep::ArmourShops, PollStep::ArmourInventory]
        );
        // The inventory step retried the index on its own.
        assert_eq!(upstream.hits("/shop/armour"), 2);
    }

    #[tokio::test]
    async fn consecutive_cycles_are_idempotent() {
        let upstream = FakeUpstream::start().await;
        seed(&upstream);
        let sink = PrometheusSink::new();
        let s = scheduler(&upstream, Arc::new(sink.clone()), &upstream.config());

        s.run_once().await;
        let first = sink.render().unwrap();
        s.run_once().await;
        let second = sink.render().unwrap();

        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn run_ticks_until_shutdown() {
        let upstream = FakeUpstream::start().await;
        seed(&upstream);
        let config = ExporterConfig {
            poll_interval: Duration::from_millis(20),
            steps: vec![PollStep::Market],
            ..upstream.config()
        };
        let s = scheduler(&upstream, Arc::new(RecordingSink::new()), &config);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(async move { s.run(shutdown_rx).await });

        tokio::time::sleep(Duration::from_millis(150)).await;
        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("scheduler did not stop")
            .unwrap();

        assert!(upstream.hits("/stocks") >= 2);
    }
}
