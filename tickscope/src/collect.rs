//! Collectors: turn host snapshots into recorded samples.
//!
//! A [`Collector`] is invoked once per collection cycle with a timestamp
//! and a handle to the host probe, and records zero or more samples
//! through the store. The scheduler runs collectors on independent tasks:
//! cycles may overlap under load, so a collector with internal state must
//! serialize that state itself (see [`SystemCollector`]'s GC baseline).
//!
//! Failure is per-collector: a returned error is logged by the scheduler
//! and the other collectors and future cycles run unaffected.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::PipelineConfig;
use crate::error::CollectError;
use crate::host::HostProbe;
use crate::sample::sanitize_key;
use crate::store::SeriesStore;

/// Entities in one cell before it is reported as a hotspot.
pub const CELL_HOTSPOT_THRESHOLD: u64 = 20;

/// Same-type entities in one cell before the type gets its own series.
pub const TYPE_HOTSPOT_THRESHOLD: u64 = 12;

/// Busiest types per world that get their own series.
const TOP_TYPES_PER_WORLD: usize = 10;

/// Busiest types globally that get their own series.
const TOP_TYPES_GLOBAL: usize = 15;

/// A source of samples invoked once per collection cycle.
pub trait Collector: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Samples host state at `timestamp` and records the results.
    ///
    /// # Errors
    ///
    /// Returns [`CollectError`] when the host probe fails; the scheduler
    /// logs it and carries on.
    fn collect(
        &self,
        store: &SeriesStore,
        host: &dyn HostProbe,
        timestamp: u64,
    ) -> Result<(), CollectError>;
}

/// The collector set the pipeline runs by default, honoring the
/// per-category toggles in `config`.
pub fn default_collectors(config: &PipelineConfig) -> Vec<Arc<dyn Collector>> {
    let mut collectors: Vec<Arc<dyn Collector>> = vec![Arc::new(SystemCollector::new())];
    collectors.push(Arc::new(WorldCollector::new(
        config.collect_block_entity_metrics,
    )));
    if config.collect_entity_metrics {
        collectors.push(Arc::new(EntityCollector::new(config.collect_chunk_metrics)));
    }
    collectors
}

/// Metric key fragment from a raw type id (`minecraft:zombie` becomes
/// `minecraft.zombie`).
fn type_key(raw: &str) -> String {
    sanitize_key(&raw.replace(':', ".")).into_owned()
}

/// Top `n` entries by count, descending; names break ties so output is
/// stable across cycles.
fn top_n(counts: &HashMap<String, u64>, n: usize) -> Vec<(&str, u64)> {
    let mut entries: Vec<(&str, u64)> = counts.iter().map(|(k, &v)| (k.as_str(), v)).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    entries.truncate(n);
    entries
}

/// Process-level gauges: memory, threads, CPU, and GC activity.
///
/// GC counters arrive from the probe as monotonic totals; this collector
/// keeps the previous totals and derives per-cycle deltas (`gc.<name>.rate`)
/// and average pause times itself. The baseline map is mutex-guarded, so
/// overlapping invocations serialize on it.
#[derive(Debug, Default)]
pub struct SystemCollector {
    gc_baseline: Mutex<HashMap<String, (u64, u64)>>,
}

impl SystemCollector {
    /// Creates a collector with an empty GC baseline.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Collector for SystemCollector {
    fn name(&self) -> &'static str {
        "system"
    }

    #[allow(clippy::cast_precision_loss)] // counters are far below 2^52
    fn collect(
        &self,
        store: &SeriesStore,
        host: &dyn HostProbe,
        timestamp: u64,
    ) -> Result<(), CollectError> {
        let sys = host.system().map_err(|source| CollectError::Probe {
            collector: self.name(),
            source,
        })?;

        const MIB: f64 = (1024 * 1024) as f64;
        let used = sys.memory_used_bytes as f64 / MIB;
        let max = sys.memory_max_bytes as f64 / MIB;
        store.record("memory.used", timestamp, used);
        store.record(
            "memory.committed",
            timestamp,
            sys.memory_committed_bytes as f64 / MIB,
        );
        store.record("memory.max", timestamp, max);
        if sys.memory_max_bytes > 0 {
            store.record("memory.utilization", timestamp, used / max * 100.0);
        }

        store.record("threads.active", timestamp, f64::from(sys.threads_current));
        store.record("threads.peak", timestamp, f64::from(sys.threads_peak));

        if let Some(pct) = sys.cpu_process_pct {
            store.record("cpu.process", timestamp, pct);
        }
        if let Some(pct) = sys.cpu_system_pct {
            store.record("cpu.system", timestamp, pct);
        }
        if let Some(load) = sys.load_average {
            store.record("cpu.system_load_average", timestamp, load);
        }
        store.record(
            "cpu.available_processors",
            timestamp,
            f64::from(sys.available_processors),
        );

        let mut baseline = self.gc_baseline.lock();
        for gc in &sys.gc {
            let key = sanitize_key(&gc.name.to_lowercase().replace(' ', "_")).into_owned();
            store.record(&format!("gc.{key}.count"), timestamp, gc.collections as f64);
            store.record(&format!("gc.{key}.time"), timestamp, gc.total_time_ms as f64);

            if let Some(&(last_count, last_time)) = baseline.get(&gc.name) {
                let count_delta = gc.collections.saturating_sub(last_count);
                let time_delta = gc.total_time_ms.saturating_sub(last_time);
                store.record(&format!("gc.{key}.rate"), timestamp, count_delta as f64);
                if count_delta > 0 {
                    store.record(
                        &format!("gc.{key}.avg_time"),
                        timestamp,
                        time_delta as f64 / count_delta as f64,
                    );
                }
            }
            baseline.insert(gc.name.clone(), (gc.collections, gc.total_time_ms));
        }

        Ok(())
    }
}

/// World-level aggregates: loaded chunks and block-entity populations.
#[derive(Debug)]
pub struct WorldCollector {
    collect_block_entities: bool,
}

impl WorldCollector {
    /// Creates a world collector; `collect_block_entities` gates the
    /// block-entity series.
    pub fn new(collect_block_entities: bool) -> Self {
        Self {
            collect_block_entities,
        }
    }
}

impl Collector for WorldCollector {
    fn name(&self) -> &'static str {
        "world"
    }

    #[allow(clippy::cast_precision_loss)] // counts are far below 2^52
    fn collect(
        &self,
        store: &SeriesStore,
        host: &dyn HostProbe,
        timestamp: u64,
    ) -> Result<(), CollectError> {
        let worlds = host.worlds().map_err(|source| CollectError::Probe {
            collector: self.name(),
            source,
        })?;

        let mut total_chunks = 0u64;
        let mut total_block_entities = 0u64;
        let mut global_types: HashMap<String, u64> = HashMap::new();

        for world in &worlds {
            let prefix = format!("world.{}", sanitize_key(&world.name));

            store.record(
                &format!("{prefix}.chunks.loaded"),
                timestamp,
                world.loaded_chunks as f64,
            );
            total_chunks += world.loaded_chunks;

            if self.collect_block_entities {
                let world_total: u64 = world.block_entities_by_type.values().sum();
                store.record(
                    &format!("{prefix}.block_entities.total"),
                    timestamp,
                    world_total as f64,
                );
                total_block_entities += world_total;

                for (raw, count) in top_n(&world.block_entities_by_type, TOP_TYPES_PER_WORLD) {
                    store.record(
                        &format!("{prefix}.block_entities.types.{}", type_key(raw)),
                        timestamp,
                        count as f64,
                    );
                }
                for (raw, count) in &world.block_entities_by_type {
                    *global_types.entry(raw.clone()).or_default() += count;
                }
            }
        }

        store.record("chunks.loaded", timestamp, total_chunks as f64);
        if self.collect_block_entities {
            store.record(
                "block_entities.total",
                timestamp,
                total_block_entities as f64,
            );
            for (raw, count) in top_n(&global_types, TOP_TYPES_GLOBAL) {
                store.record(
                    &format!("block_entities.types.{}", type_key(raw)),
                    timestamp,
                    count as f64,
                );
            }
        }

        Ok(())
    }
}

/// Entity aggregates: totals, category breakdowns, busiest types, and
/// hotspot cells.
///
/// Hotspots mint metric names from live activity
/// (`world.<dim>.hotspot.<x>.<z>.<field>`), so the store's key space grows
/// with entity density; the store's series cap bounds the damage.
#[derive(Debug)]
pub struct EntityCollector {
    collect_hotspots: bool,
}

impl EntityCollector {
    /// Creates an entity collector; `collect_hotspots` gates the per-cell
    /// density series.
    pub fn new(collect_hotspots: bool) -> Self {
        Self { collect_hotspots }
    }
}

impl Collector for EntityCollector {
    fn name(&self) -> &'static str {
        "entity"
    }

    #[allow(clippy::cast_precision_loss)] // counts are far below 2^52
    fn collect(
        &self,
        store: &SeriesStore,
        host: &dyn HostProbe,
        timestamp: u64,
    ) -> Result<(), CollectError> {
        let worlds = host.worlds().map_err(|source| CollectError::Probe {
            collector: self.name(),
            source,
        })?;

        let mut total_entities = 0u64;
        let mut global_categories: HashMap<String, u64> = HashMap::new();
        let mut global_types: HashMap<String, u64> = HashMap::new();

        for world in &worlds {
            let prefix = format!("world.{}", sanitize_key(&world.name));

            store.record(
                &format!("{prefix}.entities.total"),
                timestamp,
                world.entities_total as f64,
            );
            total_entities += world.entities_total;

            for (category, count) in &world.entities_by_category {
                store.record(
                    &format!("{prefix}.entities.{}", sanitize_key(category)),
                    timestamp,
                    *count as f64,
                );
                *global_categories.entry(category.clone()).or_default() += count;
            }

            for (raw, count) in top_n(&world.entities_by_type, TOP_TYPES_PER_WORLD) {
                store.record(
                    &format!("{prefix}.entities.types.{}", type_key(raw)),
                    timestamp,
                    count as f64,
                );
            }
            for (raw, count) in &world.entities_by_type {
                *global_types.entry(raw.clone()).or_default() += count;
            }

            if self.collect_hotspots {
                for (cell, occupancy) in &world.entities_by_cell {
                    if occupancy.total < CELL_HOTSPOT_THRESHOLD {
                        continue;
                    }
                    store.record(
                        &format!("{prefix}.hotspot.{}.{}.total", cell.x, cell.z),
                        timestamp,
                        occupancy.total as f64,
                    );
                    for (raw, count) in &occupancy.by_type {
                        if *count >= TYPE_HOTSPOT_THRESHOLD {
                            store.record(
                                &format!(
                                    "{prefix}.hotspot.{}.{}.{}",
                                    cell.x,
                                    cell.z,
                                    type_key(raw)
                                ),
                                timestamp,
                                *count as f64,
                            );
                        }
                    }
                }
            }
        }

        store.record("entities.total", timestamp, total_entities as f64);
        for (category, count) in &global_categories {
            store.record(
                &format!("entities.{}", sanitize_key(category)),
                timestamp,
                *count as f64,
            );
        }
        for (raw, count) in top_n(&global_types, TOP_TYPES_GLOBAL) {
            store.record(
                &format!("entities.types.{}", type_key(raw)),
                timestamp,
                count as f64,
            );
        }

        Ok(())
    }
}
