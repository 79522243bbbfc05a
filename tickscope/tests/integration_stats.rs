//! Integration tests for the derived-statistics series.

use tickscope::{SeriesStore, StatisticsEngine};

fn latest(store: &SeriesStore, name: &str) -> f64 {
    store
        .latest(name)
        .unwrap_or_else(|| panic!("no samples for {name}"))
        .value
}

#[test]
fn test_window_statistics_match_hand_computed_values() {
    let engine = StatisticsEngine::new();
    let store = SeriesStore::new(64, 64);

    // Exactly the minimum window: durations 10, 20, .. 200 ms.
    for i in 1..=20u64 {
        engine.observe(&store, i * 1_000, (i * 10) as f64);
    }

    assert_eq!(latest(&store, "server.tick_time"), 200.0);
    assert_eq!(latest(&store, "server.tick_time.mean"), 105.0);
    assert_eq!(latest(&store, "server.tick_time.median"), 105.0);
    // Nearest rank, zero-indexed: p95 -> ceil(0.95 * 20) - 1 = 18 -> 190,
    // p99 -> ceil(0.99 * 20) - 1 = 19 -> 200.
    assert_eq!(latest(&store, "server.tick_time.p95"), 190.0);
    assert_eq!(latest(&store, "server.tick_time.p99"), 200.0);

    // Population standard deviation of 10..200 step 10.
    let std_dev = latest(&store, "server.tick_time.std_dev");
    assert!((std_dev - 3325.0_f64.sqrt()).abs() < 1e-9, "got {std_dev}");
}

#[test]
fn test_derived_series_wait_for_warmup() {
    let engine = StatisticsEngine::new();
    let store = SeriesStore::new(64, 64);

    for i in 1..20u64 {
        engine.observe(&store, i * 1_000, 45.0);
    }

    // 19 raw samples recorded, but no derived statistics yet.
    assert_eq!(store.get("server.tick_time").len(), 19);
    assert!(store.get("server.tick_time.mean").is_empty());
    assert!(store.get("server.tick_time.p95").is_empty());

    engine.observe(&store, 20_000, 45.0);
    assert_eq!(store.get("server.tick_time.mean").len(), 1);
}

#[test]
fn test_lag_spike_window_counts() {
    let engine = StatisticsEngine::new();
    let store = SeriesStore::new(64, 64);

    // Spikes land at 0, 5s, 15s, 65s, 66s; every observation is above the
    // 100 ms threshold.
    for ts in [0u64, 5_000, 15_000, 65_000, 66_000] {
        engine.observe(&store, ts, 150.0);
    }

    // Measured at t = 66_000: the 60 s window starts at 6_000, so the
    // events at 0 and 5_000 are out and 15_000, 65_000, 66_000 are in.
    assert_eq!(latest(&store, "server.lag_spikes.count_60s"), 3.0);
    // The 10 s window starts at 56_000: 65_000 and 66_000 are in.
    assert_eq!(latest(&store, "server.lag_spikes.count_10s"), 2.0);
    assert_eq!(latest(&store, "server.lag_spikes.current"), 150.0);

    // Boundary inclusion: an event exactly window-many ms old counts.
    let (_, long) = engine.spike_counts(65_000);
    assert_eq!(long, 4); // 5_000 == 65_000 - 60_000 is included
    let (short, _) = engine.spike_counts(75_000);
    assert_eq!(short, 2); // 65_000 == 75_000 - 10_000 is included
}

#[test]
fn test_state_resets_with_the_engine() {
    // Nothing persists: a fresh engine starts from an empty window and
    // spike log even against a store that already has history.
    let store = SeriesStore::new(64, 64);
    let first = StatisticsEngine::new();
    for i in 1..=30u64 {
        first.observe(&store, i * 1_000, 150.0);
    }
    assert!(!first.lag_spikes().is_empty());

    let second = StatisticsEngine::new();
    assert!(second.lag_spikes().is_empty());
    second.observe(&store, 31_000, 45.0);
    // One observation is far below the warmup, so the fresh engine
    // records no derived stats even though the store has older ones.
    assert_eq!(store.get("server.tick_time.mean").len(), 11);
}
