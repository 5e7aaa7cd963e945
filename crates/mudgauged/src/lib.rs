//! Composition root of the mudgauge daemon.
//!
//! Assembles every subsystem from one `ExporterConfig`:
//! - Prometheus sink (the only metric registry in the process)
//! - Upstream client
//! - Scheduler (market and armour steps)
//! - Shop collector (run by `/metrics` scrapes)
//! - HTTP listeners (combined, or health + metrics split)

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};

use mudgauge_api::ApiState;
use mudgauge_collector::{Scheduler, ShopCollector};
use mudgauge_core::ExporterConfig;
use mudgauge_fetch::UpstreamClient;
use mudgauge_metrics::{MetricSink, PrometheusSink};

/// A fully wired, not yet listening exporter.
pub struct Exporter {
    config: ExporterConfig,
    scheduler: Scheduler,
    api: ApiState,
}

impl Exporter {
    /// Validate `config` and build every subsystem.
    pub fn new(config: ExporterConfig) -> anyhow::Result<Self> {
        config.validate().context("invalid configuration")?;

        let shared: Arc<dyn MetricSink> = Arc::new(PrometheusSink::new());

        let client = UpstreamClient::new(&config).context("failed to build upstream client")?;
        info!(base = %client.base_url(), "upstream client initialized");

        let scheduler = Scheduler::new(client.clone(), shared.clone(), &config)
            .context("failed to register scheduler gauges")?;
        info!(steps = ?scheduler.steps(), "scheduler initialized");

        let shops = config.shop_collector.then(|| {
            Arc::new(ShopCollector::new(client, config.shop_min_interval))
        });
        if shops.is_some() {
            info!(
                min_interval_secs = config.shop_min_interval.as_secs(),
                "shop collector initialized"
            );
        }

        let api = ApiState::new(shared, shops).context("failed to register api gauges")?;

        Ok(Self {
            config,
            scheduler,
            api,
        })
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Routers keyed by the address they are served on.
    pub fn routers(&self) -> Vec<(SocketAddr, Router)> {
        match self.config.metrics_listen {
            None => vec![(self.config.listen, mudgauge_api::build_router(self.api.clone()))],
            Some(metrics_addr) => vec![
                (self.config.listen, mudgauge_api::health_router(self.api.clone())),
                (metrics_addr, mudgauge_api::metrics_router(self.api.clone())),
            ],
        }
    }

    /// Bind every listener. Failure to bind is fatal.
    pub async fn bind(self) -> anyhow::Result<BoundExporter> {
        let mut listeners = Vec::new();
        for (addr, router) in self.routers() {
            let listener = TcpListener::bind(addr)
                .await
                .with_context(|| format!("failed to bind {addr}"))?;
            info!(addr = %listener.local_addr()?, "listener bound");
            listeners.push((listener, router));
        }
        Ok(BoundExporter {
            scheduler: self.scheduler,
            listeners,
        })
    }
}

/// An exporter whose listeners are bound.
pub struct BoundExporter {
    scheduler: Scheduler,
    listeners: Vec<(TcpListener, Router)>,
}

impl BoundExporter {
    /// Actual listen addresses, in [`Exporter::routers`] order.
    pub fn local_addrs(&self) -> anyhow::Result<Vec<SocketAddr>> {
        self.listeners
            .iter()
            .map(|(l, _)| l.local_addr().context("listener has no local address"))
            .collect()
    }

    /// Serve HTTP and run the scheduler until `shutdown` resolves.
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let scheduler = self.scheduler;
        let scheduler_shutdown = shutdown_rx.clone();
        let scheduler_handle = tokio::spawn(async move {
            scheduler.run(scheduler_shutdown).await;
        });

        let mut servers = Vec::new();
        for (listener, router) in self.listeners {
            let mut rx = shutdown_rx.clone();
            servers.push(tokio::spawn(async move {
                axum::serve(listener, router)
                    .with_graceful_shutdown(async move {
                        let _ = rx.changed().await;
                    })
                    .await
            }));
        }

        shutdown.await;
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);

        for server in servers {
            match server.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "http server exited with error"),
                Err(e) => warn!(error = %e, "http server task failed"),
            }
        }
        let _ = scheduler_handle.await;

        info!("mudgauge exporter stopped");
        Ok(())
    }
}
