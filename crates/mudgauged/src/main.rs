//! mudgauged — the CoreMUD metrics exporter daemon.
//!
//! Polls the CoreMUD HTTP API and serves the results as Prometheus gauges.
//!
//! # Usage
//!
//! ```text
//! mudgauged standalone --listen 0.0.0.0:8080
//! mudgauged standalone --listen 0.0.0.0:8080 --metrics-listen 0.0.0.0:9090
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use mudgauge_core::config::DEFAULT_API_BASE_URL;
use mudgauge_core::{ExporterConfig, PollStep, parse_duration};
use mudgauged::Exporter;

const DEFAULT_LOG_FILTER: &str = "info,mudgauged=debug,mudgauge=debug";

#[derive(Parser)]
#[command(name = "mudgauged", about = "CoreMUD metrics exporter", version)]
struct Cli {
    /// Log output format.
    #[arg(
        long,
        env = "MUDGAUGE_LOG_FORMAT",
        value_enum,
        default_value_t = LogFormat::Text,
        global = true
    )]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Run the exporter (scheduler, shop collector, HTTP listeners).
    Standalone(StandaloneArgs),
}

#[derive(Args, Debug)]
struct StandaloneArgs {
    /// Root of the CoreMUD API.
    #[arg(long, env = "MUDGAUGE_API_BASE_URL", default_value = DEFAULT_API_BASE_URL)]
    api_base_url: String,

    /// Scheduler tick period ("60s", "5m", ...).
    #[arg(
        long,
        env = "MUDGAUGE_POLL_INTERVAL",
        default_value = "60s",
        value_parser = parse_duration
    )]
    poll_interval: Duration,

    /// Timeout for each upstream request.
    #[arg(
        long,
        env = "MUDGAUGE_REQUEST_TIMEOUT",
        default_value = "10s",
        value_parser = parse_duration
    )]
    request_timeout: Duration,

    /// Minimum time between two scrape-triggered shop collections.
    #[arg(
        long,
        env = "MUDGAUGE_SHOP_MIN_INTERVAL",
        default_value = "1h",
        value_parser = parse_duration
    )]
    shop_min_interval: Duration,

    /// Do not walk the shop API on /metrics scrapes.
    #[arg(long, env = "MUDGAUGE_NO_SHOP_COLLECTOR")]
    no_shop_collector: bool,

    /// Steps run on every scheduler tick, comma separated.
    #[arg(
        long,
        env = "MUDGAUGE_STEPS",
        value_delimiter = ',',
        default_value = "market,armour-shops,armour-inventory"
    )]
    steps: Vec<PollStep>,

    /// Address for health, banner, and (unless split) metrics.
    #[arg(long, env = "MUDGAUGE_LISTEN", default_value = "0.0.0.0:8080")]
    listen: SocketAddr,

    /// Serve /metrics on its own address instead.
    #[arg(long, env = "MUDGAUGE_METRICS_LISTEN")]
    metrics_listen: Option<SocketAddr>,
}

impl StandaloneArgs {
    fn into_config(self) -> ExporterConfig {
        ExporterConfig {
            api_base_url: self.api_base_url,
            poll_interval: self.poll_interval,
            request_timeout: self.request_timeout,
            shop_min_interval: self.shop_min_interval,
            shop_collector: !self.no_shop_collector,
            steps: self.steps,
            listen: self.listen,
            metrics_listen: self.metrics_listen,
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match cli.command {
        Command::Standalone(args) => run_standalone(args.into_config()).await,
    }
}

async fn run_standalone(config: ExporterConfig) -> anyhow::Result<()> {
    info!(
        base = %config.api_base_url,
        poll_interval_secs = config.poll_interval.as_secs(),
        "mudgauge exporter starting"
    );

    let exporter = Exporter::new(config)?;
    let bound = exporter.bind().await?;

    // Graceful shutdown on Ctrl-C.
    bound
        .serve(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "failed to install CTRL+C handler");
                std::future::pending::<()>().await;
            }
        })
        .await
}
