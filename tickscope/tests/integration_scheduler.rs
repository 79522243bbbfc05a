//! End-to-end pipeline tests: scheduler, collectors, store, query.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tickscope::{
    CellOccupancy, CellPos, HostProbe, MetricSelector, PipelineConfig, ProbeError, QueryService,
    Scheduler, SeriesStore, StatisticsEngine, SystemSnapshot, TickMonitor, WorldSnapshot,
    default_collectors,
};

/// A small fixed host: one world, a busy cell, some system load.
struct FixtureHost;

impl HostProbe for FixtureHost {
    fn system(&self) -> Result<SystemSnapshot, ProbeError> {
        Ok(SystemSnapshot {
            memory_used_bytes: 256 * 1024 * 1024,
            memory_committed_bytes: 512 * 1024 * 1024,
            memory_max_bytes: 1024 * 1024 * 1024,
            threads_current: 12,
            threads_peak: 16,
            cpu_process_pct: Some(20.0),
            cpu_system_pct: Some(35.0),
            load_average: Some(0.8),
            available_processors: 4,
            gc: Vec::new(),
        })
    }

    fn worlds(&self) -> Result<Vec<WorldSnapshot>, ProbeError> {
        let mut world = WorldSnapshot {
            name: "minecraft:overworld".to_string(),
            loaded_chunks: 64,
            entities_total: 40,
            ..Default::default()
        };
        world.entities_by_category =
            HashMap::from([("hostile".to_string(), 30), ("passive".to_string(), 10)]);
        world.entities_by_type = HashMap::from([("minecraft:zombie".to_string(), 30)]);
        world.entities_by_cell = HashMap::from([(
            CellPos { x: 2, z: -1 },
            CellOccupancy {
                total: 30,
                by_type: HashMap::from([("minecraft:zombie".to_string(), 30)]),
            },
        )]);
        world.block_entities_by_type = HashMap::from([("minecraft:chest".to_string(), 5)]);
        Ok(vec![world])
    }
}

struct Pipeline {
    store: Arc<SeriesStore>,
    stats: Arc<StatisticsEngine>,
    ticks: Arc<TickMonitor>,
    scheduler: Scheduler,
    config: PipelineConfig,
}

fn pipeline() -> Pipeline {
    let config = PipelineConfig::default();
    let store = Arc::new(SeriesStore::new(config.history_size, config.max_series));
    let stats = Arc::new(StatisticsEngine::new());
    let ticks = Arc::new(TickMonitor::new());
    let scheduler = Scheduler::new(
        Arc::clone(&store),
        Arc::clone(&stats),
        Arc::clone(&ticks),
        Arc::new(FixtureHost),
        default_collectors(&config),
    );
    Pipeline {
        store,
        stats,
        ticks,
        scheduler,
        config,
    }
}

#[tokio::test(start_paused = true)]
async fn test_tick_series_accumulates_end_to_end() {
    let p = pipeline();

    // The host ticks once before collection starts so a duration exists.
    p.ticks.on_tick_start();
    p.ticks.on_tick_end();

    p.scheduler.start(Duration::from_millis(50));
    tokio::time::sleep(Duration::from_millis(500)).await;
    p.scheduler.stop().await;

    let query = QueryService::new(Arc::clone(&p.store), Arc::clone(&p.stats), p.config.clone());
    let result = query.metrics(&MetricSelector {
        metric: Some("server.tick_time".to_string()),
        prefix: None,
    });

    let samples = &result["server.tick_time"];
    assert!(samples.len() >= 5, "got {} samples", samples.len());
    assert!(
        samples
            .windows(2)
            .all(|pair| pair[0].timestamp <= pair[1].timestamp),
        "timestamps must be non-decreasing"
    );
}

#[tokio::test(start_paused = true)]
async fn test_all_collectors_feed_the_store() {
    let p = pipeline();
    p.ticks.on_tick_start();
    p.ticks.on_tick_end();

    p.scheduler.start(Duration::from_millis(100));
    tokio::time::sleep(Duration::from_millis(350)).await;
    p.scheduler.stop().await;

    // System collector output.
    assert_eq!(p.store.latest("memory.used").unwrap().value, 256.0);
    assert_eq!(p.store.latest("threads.active").unwrap().value, 12.0);
    // World collector output.
    assert_eq!(p.store.latest("chunks.loaded").unwrap().value, 64.0);
    assert_eq!(
        p.store
            .latest("world.minecraft_overworld.block_entities.types.minecraft.chest")
            .unwrap()
            .value,
        5.0
    );
    // Entity collector output, including the hotspot cell.
    assert_eq!(p.store.latest("entities.total").unwrap().value, 40.0);
    assert_eq!(
        p.store
            .latest("world.minecraft_overworld.hotspot.2.-1.total")
            .unwrap()
            .value,
        30.0
    );
    // TPS estimate from the tick monitor's average.
    assert!(p.store.latest("server.tps").is_some());

    // Every series saw one sample per cycle.
    let cycles = p.store.get("chunks.loaded").len();
    assert!(cycles >= 3, "got {cycles} cycles");
    assert_eq!(p.store.get("entities.total").len(), cycles);
}

#[tokio::test(start_paused = true)]
async fn test_collection_runs_without_any_host_ticks() {
    // A host that never ticks still gets resource collection; only the
    // tick-derived series stay empty.
    let p = pipeline();

    p.scheduler.start(Duration::from_millis(100));
    tokio::time::sleep(Duration::from_millis(250)).await;
    p.scheduler.stop().await;

    assert!(p.store.latest("memory.used").is_some());
    assert!(p.store.get("server.tick_time").is_empty());
    assert!(p.store.get("server.tps").is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_query_service_is_live_during_collection() {
    let p = pipeline();
    p.ticks.on_tick_start();
    p.ticks.on_tick_end();

    let query = QueryService::new(Arc::clone(&p.store), Arc::clone(&p.stats), p.config.clone());

    p.scheduler.start(Duration::from_millis(50));
    for _ in 0..5 {
        tokio::time::sleep(Duration::from_millis(60)).await;
        // Reads interleave with cycles without errors or torn data.
        let all = query.metrics(&MetricSelector::default());
        for samples in all.values() {
            assert!(
                samples
                    .windows(2)
                    .all(|pair| pair[0].timestamp <= pair[1].timestamp)
            );
        }
    }
    p.scheduler.stop().await;

    let list = query.list();
    assert!(list.total > 0);
    assert_eq!(list.metrics.len(), list.total);
}
