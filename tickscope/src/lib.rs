//! # tickscope
//!
//! Embedded tick telemetry pipeline for game servers.
//!
//! tickscope samples performance and resource indicators from a running
//! host process on a fixed cadence, stores them as bounded in-memory time
//! series, derives statistical signals from the host's tick durations
//! (rolling percentiles, lag-spike detection), and serves read-only
//! snapshots to a query layer. The host is a collaborator, never a
//! dependency: it drives two tick callbacks and answers aggregate
//! snapshot probes, and the pipeline does the rest off the host's thread.
//!
//! **Status**: This crate is in early development. The API is not yet stable.
//!
//! ## Key Properties
//!
//! - Bounded memory by construction: fixed-capacity ring buffer per
//!   series, capped series cardinality, bounded spike log
//! - Never blocks the host: collection runs on its own tasks; the tick
//!   hooks are two mutex-guarded timestamp writes
//! - Failure stays local: a failing collector is logged and isolated; the
//!   query path degrades to "no data", never to an error
//! - Fixed-rate cadence that does not drift under load
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use tickscope::{
//!     HostProbe, MetricSelector, PipelineConfig, ProbeError, QueryService, Scheduler,
//!     SeriesStore, StatisticsEngine, SystemSnapshot, TickMonitor, WorldSnapshot,
//!     default_collectors,
//! };
//!
//! struct MyServer;
//!
//! impl HostProbe for MyServer {
//!     fn system(&self) -> Result<SystemSnapshot, ProbeError> {
//!         Ok(SystemSnapshot::default())
//!     }
//!     fn worlds(&self) -> Result<Vec<WorldSnapshot>, ProbeError> {
//!         Ok(Vec::new())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = PipelineConfig::default();
//!     config.validate().expect("default config is valid");
//!
//!     // Construct everything once at startup and pass references down.
//!     let store = Arc::new(SeriesStore::new(config.history_size, config.max_series));
//!     let stats = Arc::new(StatisticsEngine::new());
//!     let ticks = Arc::new(TickMonitor::new());
//!     let host = Arc::new(MyServer);
//!
//!     let scheduler = Scheduler::new(
//!         Arc::clone(&store),
//!         Arc::clone(&stats),
//!         Arc::clone(&ticks),
//!         host,
//!         default_collectors(&config),
//!     );
//!     scheduler.start(Duration::from_millis(config.collection_interval_ms));
//!
//!     // The host brackets each of its execution cycles:
//!     ticks.on_tick_start();
//!     // ... one tick of host work ...
//!     ticks.on_tick_end();
//!
//!     // The query side reads consistent snapshots at any time.
//!     let query = QueryService::new(store, stats, config);
//!     let tick_series = query.metrics(&MetricSelector {
//!         metric: Some("server.tick_time".to_string()),
//!         prefix: None,
//!     });
//!     drop(tick_series);
//!
//!     scheduler.stop().await;
//! }
//! ```
//!
//! ## Architecture
//!
//! Host tick -> [`TickMonitor`] -> [`Scheduler`] cycle -> collectors run
//! concurrently -> samples land in [`SeriesStore`] -> [`StatisticsEngine`]
//! derives secondary series -> [`QueryService`] serves snapshots on demand.
//!
//! ## Modules
//!
//! - [`store`] — series store, one ring buffer per metric name
//! - [`ring`] — fixed-capacity ring buffer
//! - [`scheduler`] — fixed-rate collection cadence and fan-out
//! - [`collect`] — collector capability and the built-in collectors
//! - [`stats`] — rolling tick statistics and lag spikes
//! - [`host`] — tick hooks and host snapshot interfaces
//! - [`query`] — read-side facade and response types
//! - [`config`] — configuration surface
//! - [`sample`] — sample and metric-key primitives
//! - [`error`] — error types

pub mod collect;
pub mod config;
pub mod error;
pub mod host;
pub mod query;
pub mod ring;
pub mod sample;
pub mod scheduler;
pub mod stats;
pub mod store;

// Re-export primary API types at crate root for convenience.
pub use collect::{Collector, EntityCollector, SystemCollector, WorldCollector, default_collectors};
pub use config::PipelineConfig;
pub use error::{CollectError, ConfigError, ProbeError, Result, TickscopeError};
pub use host::{
    CellOccupancy, CellPos, GcCounter, HostProbe, SystemSnapshot, TickMonitor, WorldSnapshot,
};
pub use query::{
    ConfigResponse, ErrorResponse, LagSpikeResponse, MetricListResponse, MetricSelector,
    QueryService,
};
pub use ring::RingBuffer;
pub use sample::{Sample, now_millis, sanitize_key};
pub use scheduler::Scheduler;
pub use stats::{LagSpike, StatisticsEngine, estimate_tps};
pub use store::SeriesStore;
