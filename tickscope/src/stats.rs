//! Derived tick statistics: rolling-window percentiles and lag spikes.
//!
//! The engine consumes one signal, the host's tick duration, and derives
//! secondary series from it each collection cycle: rolling mean, population
//! standard deviation, median, p95 and p99 over the last [`TICK_WINDOW`]
//! ticks, plus a bounded log of lag-spike events with trailing 10 s / 60 s
//! counts. Nothing here survives a restart; the window and the spike queue
//! start empty.

use std::collections::VecDeque;

use parking_lot::Mutex;
use serde::Serialize;

use crate::store::SeriesStore;

/// Rolling window length for tick statistics (30 s of ticks at 20 per second).
pub const TICK_WINDOW: usize = 600;

/// Minimum window fill before derived statistics are recorded.
pub const MIN_WINDOW_SAMPLES: usize = 20;

/// Tick durations above this many milliseconds count as lag spikes.
pub const LAG_SPIKE_THRESHOLD_MS: f64 = 100.0;

/// Retained spike events; the oldest is dropped on overflow, so bursty
/// periods age out faster than quiet ones.
pub const MAX_LAG_SPIKES: usize = 50;

const SPIKE_WINDOW_SHORT_MS: u64 = 10_000;
const SPIKE_WINDOW_LONG_MS: u64 = 60_000;

/// One tick whose duration crossed the lag-spike threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LagSpike {
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    /// Duration of the offending tick.
    #[serde(rename = "tickTimeMs")]
    pub tick_time_ms: f64,
}

/// Rolling statistics over the host's tick durations.
///
/// One writer (the scheduler) calls [`observe`](Self::observe) per cycle;
/// readers take [`lag_spikes`](Self::lag_spikes) snapshots concurrently.
#[derive(Debug, Default)]
pub struct StatisticsEngine {
    inner: Mutex<StatsState>,
}

#[derive(Debug, Default)]
struct StatsState {
    window: VecDeque<f64>,
    spikes: VecDeque<LagSpike>,
}

impl StatisticsEngine {
    /// Creates an engine with an empty window and spike log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one tick duration into the engine and records the raw and
    /// derived series into `store`.
    #[allow(clippy::cast_precision_loss)] // spike counts are bounded by the queue cap
    pub fn observe(&self, store: &SeriesStore, timestamp: u64, tick_ms: f64) {
        let mut state = self.inner.lock();

        state.window.push_back(tick_ms);
        while state.window.len() > TICK_WINDOW {
            state.window.pop_front();
        }

        store.record("server.tick_time", timestamp, tick_ms);

        if state.window.len() >= MIN_WINDOW_SAMPLES {
            let mut sorted: Vec<f64> = state.window.iter().copied().collect();
            sorted.sort_unstable_by(f64::total_cmp);

            let mean = mean(&sorted);
            store.record("server.tick_time.mean", timestamp, mean);
            store.record(
                "server.tick_time.std_dev",
                timestamp,
                population_std_dev(&sorted, mean),
            );
            store.record("server.tick_time.median", timestamp, median(&sorted));
            store.record("server.tick_time.p95", timestamp, nearest_rank(&sorted, 0.95));
            store.record("server.tick_time.p99", timestamp, nearest_rank(&sorted, 0.99));
        }

        if tick_ms > LAG_SPIKE_THRESHOLD_MS {
            state.spikes.push_back(LagSpike {
                timestamp,
                tick_time_ms: tick_ms,
            });
            while state.spikes.len() > MAX_LAG_SPIKES {
                state.spikes.pop_front();
            }

            let (short, long) = count_in_windows(&state.spikes, timestamp);
            store.record("server.lag_spikes.current", timestamp, tick_ms);
            store.record("server.lag_spikes.count_10s", timestamp, short as f64);
            store.record("server.lag_spikes.count_60s", timestamp, long as f64);
        }
    }

    /// Retained lag spikes, oldest first.
    pub fn lag_spikes(&self) -> Vec<LagSpike> {
        self.inner.lock().spikes.iter().copied().collect()
    }

    /// Counts of retained spikes within the trailing 10 s and 60 s windows
    /// ending at `now`. A spike exactly at the window edge
    /// (`timestamp == now - window`) counts.
    pub fn spike_counts(&self, now: u64) -> (usize, usize) {
        count_in_windows(&self.inner.lock().spikes, now)
    }
}

fn count_in_windows(spikes: &VecDeque<LagSpike>, now: u64) -> (usize, usize) {
    let short_cutoff = now.saturating_sub(SPIKE_WINDOW_SHORT_MS);
    let long_cutoff = now.saturating_sub(SPIKE_WINDOW_LONG_MS);

    let short = spikes.iter().filter(|s| s.timestamp >= short_cutoff).count();
    let long = spikes.iter().filter(|s| s.timestamp >= long_cutoff).count();
    (short, long)
}

/// Estimates ticks-per-second from a mean tick duration, capped at the
/// host's nominal 20 TPS (a tick under 50 ms still only runs once per
/// scheduling slot).
pub fn estimate_tps(mean_tick_ms: f64) -> f64 {
    (1000.0 / mean_tick_ms.max(50.0)).min(20.0)
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn population_std_dev(values: &[f64], mean: f64) -> f64 {
    let variance =
        values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Middle element of a sorted slice; mean of the two middles when even.
fn median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    }
}

/// Nearest-rank percentile: element at `ceil(p * n) - 1` of a sorted slice.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // rank <= n
fn nearest_rank(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    let rank = (p * n as f64).ceil() as usize;
    sorted[rank.clamp(1, n) - 1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_rank_hand_computed() {
        // 20 values: 10, 20, .. 200.
        let window: Vec<f64> = (1..=20).map(|i| (i * 10) as f64).collect();

        assert_eq!(median(&window), 105.0); // (100 + 110) / 2
        assert_eq!(nearest_rank(&window, 0.95), 190.0); // ceil(19.0) - 1 = index 18
        assert_eq!(nearest_rank(&window, 0.99), 200.0); // ceil(19.8) - 1 = index 19
        assert_eq!(nearest_rank(&window, 0.50), 100.0);
    }

    #[test]
    fn test_median_odd_window() {
        let window = [1.0, 3.0, 9.0];
        assert_eq!(median(&window), 3.0);
    }

    #[test]
    fn test_population_std_dev() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let m = mean(&values);
        assert_eq!(m, 5.0);
        assert_eq!(population_std_dev(&values, m), 2.0);
    }

    #[test]
    fn test_estimate_tps_caps_at_twenty() {
        assert_eq!(estimate_tps(10.0), 20.0);
        assert_eq!(estimate_tps(50.0), 20.0);
        assert_eq!(estimate_tps(100.0), 10.0);
        assert_eq!(estimate_tps(200.0), 5.0);
    }

    #[test]
    fn test_window_is_bounded() {
        let engine = StatisticsEngine::new();
        let store = SeriesStore::new(8, 64);

        for i in 0..(TICK_WINDOW as u64 + 100) {
            engine.observe(&store, i * 50, 45.0);
        }

        assert_eq!(engine.inner.lock().window.len(), TICK_WINDOW);
    }

    #[test]
    fn test_no_derived_stats_before_warmup() {
        let engine = StatisticsEngine::new();
        let store = SeriesStore::new(64, 64);

        for i in 0..(MIN_WINDOW_SAMPLES as u64 - 1) {
            engine.observe(&store, i * 50, 45.0);
        }

        assert_eq!(store.get("server.tick_time").len(), MIN_WINDOW_SAMPLES - 1);
        assert!(store.get("server.tick_time.mean").is_empty());

        engine.observe(&store, 5000, 45.0);
        assert_eq!(store.get("server.tick_time.mean").len(), 1);
    }

    #[test]
    fn test_spike_queue_is_bounded_fifo() {
        let engine = StatisticsEngine::new();
        let store = SeriesStore::new(8, 64);

        for i in 0..(MAX_LAG_SPIKES as u64 + 10) {
            engine.observe(&store, i * 1000, 150.0);
        }

        let spikes = engine.lag_spikes();
        assert_eq!(spikes.len(), MAX_LAG_SPIKES);
        // Oldest dropped: the first retained spike is the 11th observed.
        assert_eq!(spikes[0].timestamp, 10 * 1000);
        assert_eq!(spikes.last().unwrap().timestamp, (MAX_LAG_SPIKES as u64 + 9) * 1000);
    }

    #[test]
    fn test_spike_window_counts_inclusive_boundary() {
        let engine = StatisticsEngine::new();
        let store = SeriesStore::new(8, 64);

        for ts in [0u64, 5_000, 15_000, 65_000] {
            engine.observe(&store, ts, 150.0);
        }

        // At t = 66_000 the 60 s window starts at 6_000: the events at 0 and
        // 5_000 are out, 15_000 and 65_000 are in.
        let (short, long) = engine.spike_counts(66_000);
        assert_eq!(long, 2);
        // The 10 s window starts at 56_000: only 65_000 is in.
        assert_eq!(short, 1);

        // An event sitting exactly on the window edge counts.
        let (_, long) = engine.spike_counts(65_000);
        assert_eq!(long, 3); // 5_000 (== 65_000 - 60_000), 15_000, 65_000
    }

    #[test]
    fn test_fast_ticks_record_no_spike() {
        let engine = StatisticsEngine::new();
        let store = SeriesStore::new(8, 64);

        engine.observe(&store, 1000, 45.0);
        engine.observe(&store, 2000, LAG_SPIKE_THRESHOLD_MS); // at, not above

        assert!(engine.lag_spikes().is_empty());
        assert!(store.get("server.lag_spikes.current").is_empty());
    }
}
