//! Host collaborator interfaces: tick hooks and state snapshots.
//!
//! The pipeline never owns the host process. The host drives a
//! [`TickMonitor`] from its own execution loop and exposes aggregate state
//! through [`HostProbe`]; how either is obtained (instrumentation hooks,
//! event listeners, direct polling) is the host's business. The core only
//! needs the two tick timestamps and the enumerable counts.

use std::collections::{HashMap, VecDeque};
use std::time::Instant;

use parking_lot::Mutex;

use crate::error::ProbeError;

/// Ticks folded into the moving average (the host's own estimator uses
/// the same horizon).
const AVERAGE_WINDOW: usize = 100;

/// A monotonically increasing garbage-collection counter pair.
///
/// Totals, not rates: the system collector derives deltas itself.
#[derive(Debug, Clone)]
pub struct GcCounter {
    /// Collector name as the host reports it.
    pub name: String,
    /// Total collections since host start.
    pub collections: u64,
    /// Total time spent collecting, in milliseconds.
    pub total_time_ms: u64,
}

/// Process-level gauges and counters sampled from the host.
#[derive(Debug, Clone, Default)]
pub struct SystemSnapshot {
    /// Managed memory currently in use, in bytes.
    pub memory_used_bytes: u64,
    /// Memory committed by the runtime, in bytes.
    pub memory_committed_bytes: u64,
    /// Memory ceiling, in bytes. Zero when the host has no fixed limit.
    pub memory_max_bytes: u64,
    /// Live thread count.
    pub threads_current: u32,
    /// Peak thread count since host start.
    pub threads_peak: u32,
    /// Process CPU utilization in percent, if the platform exposes it.
    pub cpu_process_pct: Option<f64>,
    /// System-wide CPU utilization in percent, if available.
    pub cpu_system_pct: Option<f64>,
    /// One-minute load average, if available.
    pub load_average: Option<f64>,
    /// Logical processors available to the host.
    pub available_processors: u32,
    /// Per-collector GC totals.
    pub gc: Vec<GcCounter>,
}

/// Grid cell used to bucket entity positions for density analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellPos {
    /// Cell x coordinate.
    pub x: i32,
    /// Cell z coordinate.
    pub z: i32,
}

/// Entity occupancy of one grid cell.
#[derive(Debug, Clone, Default)]
pub struct CellOccupancy {
    /// Entities of any type in the cell.
    pub total: u64,
    /// Entity counts keyed by raw type identifier.
    pub by_type: HashMap<String, u64>,
}

/// Aggregate view of one world held by the host.
///
/// Raw identifiers (world names, type ids) may contain characters illegal
/// in metric keys; collectors sanitize them on the way into the store.
#[derive(Debug, Clone, Default)]
pub struct WorldSnapshot {
    /// World identifier.
    pub name: String,
    /// Chunks currently loaded in this world.
    pub loaded_chunks: u64,
    /// Entities of any kind in this world.
    pub entities_total: u64,
    /// Entity counts keyed by category (hostile, passive, player, ...).
    pub entities_by_category: HashMap<String, u64>,
    /// Entity counts keyed by raw type identifier.
    pub entities_by_type: HashMap<String, u64>,
    /// Per-cell entity occupancy, for hotspot detection.
    pub entities_by_cell: HashMap<CellPos, CellOccupancy>,
    /// Block-entity counts keyed by raw type identifier.
    pub block_entities_by_type: HashMap<String, u64>,
}

/// Read-only access to host state, implemented by the embedding process.
///
/// Probe methods run on collection tasks off the host's own thread and
/// must not block on host-exclusive locks for unbounded time.
pub trait HostProbe: Send + Sync {
    /// Process/OS-level gauges and counters.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError`] when the snapshot cannot currently be taken;
    /// the owning collector's cycle is skipped and logged.
    fn system(&self) -> Result<SystemSnapshot, ProbeError>;

    /// Aggregate counts for every world the host currently runs.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError`] when the snapshot cannot currently be taken.
    fn worlds(&self) -> Result<Vec<WorldSnapshot>, ProbeError>;
}

/// Tick-boundary hook the host invokes around each execution cycle.
///
/// `on_tick_start` / `on_tick_end` bracket one host tick. The monitor
/// keeps the most recent duration plus a short moving average; the
/// scheduler reads both once per collection cycle.
#[derive(Debug, Default)]
pub struct TickMonitor {
    inner: Mutex<TickState>,
}

#[derive(Debug, Default)]
struct TickState {
    started_at: Option<Instant>,
    last_tick_ms: Option<f64>,
    recent: VecDeque<f64>,
}

impl TickMonitor {
    /// Creates a monitor with no observed ticks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the start of a host tick.
    pub fn on_tick_start(&self) {
        self.inner.lock().started_at = Some(Instant::now());
    }

    /// Marks the end of a host tick and folds its duration into the
    /// rolling state. An end without a matching start is ignored.
    pub fn on_tick_end(&self) {
        let mut state = self.inner.lock();
        let Some(started_at) = state.started_at.take() else {
            tracing::debug!("tick end without start, ignoring");
            return;
        };

        let tick_ms = started_at.elapsed().as_secs_f64() * 1000.0;
        state.last_tick_ms = Some(tick_ms);
        state.recent.push_back(tick_ms);
        while state.recent.len() > AVERAGE_WINDOW {
            state.recent.pop_front();
        }
    }

    /// Duration of the most recently completed tick, in milliseconds.
    pub fn last_tick_ms(&self) -> Option<f64> {
        self.inner.lock().last_tick_ms
    }

    /// Mean duration over the recent tick window (100 ticks).
    pub fn average_tick_ms(&self) -> Option<f64> {
        let state = self.inner.lock();
        if state.recent.is_empty() {
            return None;
        }
        Some(state.recent.iter().sum::<f64>() / state.recent.len() as f64)
    }
}
