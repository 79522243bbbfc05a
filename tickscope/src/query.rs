//! Read-side query contract over the store and statistics engine.
//!
//! [`QueryService`] is the facade a transport layer (HTTP in the demo
//! server) calls into. Every operation is a pure function of current
//! pipeline state and safe to call concurrently with ongoing collection;
//! none of them can fail, since unknown names yield empty results. Transports
//! serialize the response types directly; field names match the wire
//! contract (`lagSpikes`, `tickTimeMs`, `metricsCollectionInterval`).

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::config::PipelineConfig;
use crate::sample::Sample;
use crate::stats::{LagSpike, StatisticsEngine};
use crate::store::SeriesStore;

/// Selects which series a metrics query returns.
///
/// An exact `metric` name wins over `prefix`; with neither set, every
/// series is returned.
#[derive(Debug, Clone, Default)]
pub struct MetricSelector {
    /// Restrict to one exact metric name.
    pub metric: Option<String>,
    /// Restrict to names starting with this prefix.
    pub prefix: Option<String>,
}

/// Response for metric-name enumeration.
#[derive(Debug, Serialize)]
pub struct MetricListResponse {
    /// All known metric names, sorted.
    pub metrics: Vec<String>,
    /// Number of names.
    pub total: usize,
}

/// Response for the recent lag-spike list.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LagSpikeResponse {
    /// Retained spikes, oldest first.
    pub lag_spikes: Vec<LagSpike>,
    /// Number of retained spikes.
    pub count: usize,
}

/// Read-only echo of the active configuration.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigResponse {
    /// Milliseconds between collection cycles.
    pub metrics_collection_interval: u64,
    /// Samples retained per series.
    pub metrics_history_size: usize,
}

/// Structured error payload transports send for failed requests.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// HTTP-equivalent status code.
    pub status: u16,
    /// Human-readable description.
    pub error: String,
}

impl ErrorResponse {
    /// Creates an error payload.
    pub fn new(status: u16, error: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
        }
    }
}

/// Read-only facade over the pipeline for external query layers.
pub struct QueryService {
    store: Arc<SeriesStore>,
    stats: Arc<StatisticsEngine>,
    config: PipelineConfig,
}

impl QueryService {
    /// Wires the facade to the live store, statistics engine, and the
    /// configuration it echoes.
    pub fn new(
        store: Arc<SeriesStore>,
        stats: Arc<StatisticsEngine>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            store,
            stats,
            config,
        }
    }

    /// Series snapshots matching `selector`.
    ///
    /// An unknown exact name yields an empty map, not an error; the same
    /// request keeps yielding empty maps until data arrives.
    pub fn metrics(&self, selector: &MetricSelector) -> HashMap<String, Vec<Sample>> {
        if let Some(name) = &selector.metric {
            let samples = self.store.get(name);
            if samples.is_empty() {
                HashMap::new()
            } else {
                HashMap::from([(name.clone(), samples)])
            }
        } else if let Some(prefix) = &selector.prefix {
            self.store.get_by_prefix(prefix)
        } else {
            self.store.get_all()
        }
    }

    /// All known metric names with their count.
    pub fn list(&self) -> MetricListResponse {
        let metrics = self.store.names();
        let total = metrics.len();
        MetricListResponse { metrics, total }
    }

    /// Recent lag spikes, oldest first.
    pub fn lag_spikes(&self) -> LagSpikeResponse {
        let lag_spikes = self.stats.lag_spikes();
        let count = lag_spikes.len();
        LagSpikeResponse { lag_spikes, count }
    }

    /// Read-only echo of the active configuration.
    pub fn config(&self) -> ConfigResponse {
        ConfigResponse {
            metrics_collection_interval: self.config.collection_interval_ms,
            metrics_history_size: self.config.history_size,
        }
    }
}
