//! Demo game server with an embedded tickscope telemetry pipeline.
//!
//! This binary runs a synthetic game server (worlds, wandering entities,
//! a 20 TPS tick loop with occasional lag) and wires the full pipeline
//! around it: series store, statistics engine, collection scheduler, and
//! an HTTP query API. It exists to exercise the pipeline end to end; a
//! real host would replace `sim` with its own `HostProbe` implementation
//! and call the tick hooks from its own loop.

mod api;
mod config;
mod sim;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tickscope::{
    QueryService, Scheduler, SeriesStore, StatisticsEngine, TickMonitor, default_collectors,
};

use crate::config::DemoConfig;
use crate::sim::SimulatedServer;

/// tickscope-demo-server — synthetic game server with embedded telemetry.
#[derive(Parser)]
#[command(name = "tickscope-demo-server", version, about)]
struct Cli {
    /// Path to a JSON config file.
    #[arg(long, default_value = "tickscope.json")]
    config: PathBuf,

    /// Port for the HTTP query API (overrides the config file).
    #[arg(long)]
    port: Option<u16>,

    /// Collection interval in milliseconds (overrides the config file).
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Samples retained per series (overrides the config file).
    #[arg(long)]
    history: Option<usize>,

    /// Seed for the simulated world.
    #[arg(long, default_value = "7")]
    seed: u64,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        tracing::error!("demo server failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = DemoConfig::load(&cli.config)?;
    if let Some(port) = cli.port {
        config.web_server_port = port;
    }
    if let Some(interval_ms) = cli.interval_ms {
        config.pipeline.collection_interval_ms = interval_ms;
    }
    if let Some(history) = cli.history {
        config.pipeline.history_size = history;
    }
    config.pipeline.validate()?;

    // Construct the pipeline once and pass references down; nothing here
    // reaches for globals.
    let store = Arc::new(SeriesStore::new(
        config.pipeline.history_size,
        config.pipeline.max_series,
    ));
    let stats = Arc::new(StatisticsEngine::new());
    let ticks = Arc::new(TickMonitor::new());
    let host = Arc::new(SimulatedServer::new(cli.seed));

    let scheduler = Scheduler::new(
        Arc::clone(&store),
        Arc::clone(&stats),
        Arc::clone(&ticks),
        Arc::clone(&host) as _,
        default_collectors(&config.pipeline),
    );
    scheduler.start(Duration::from_millis(config.pipeline.collection_interval_ms));

    // The simulated host ticks on its own schedule, independent of
    // collection.
    tokio::spawn(Arc::clone(&host).run(Arc::clone(&ticks)));

    // Query API on a dedicated thread; all reads are lock-scoped
    // snapshots, safe against ongoing collection.
    let query = Arc::new(QueryService::new(
        Arc::clone(&store),
        Arc::clone(&stats),
        config.pipeline.clone(),
    ));
    let port = config.web_server_port;
    std::thread::spawn(move || api::run_api_server(query, port));
    tracing::info!("dashboard data at http://localhost:{port}/api/metrics");

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    scheduler.stop().await;
    Ok(())
}
