//! Synthetic game-server host for the demo.
//!
//! Stands in for a real game server: a couple of worlds with wandering
//! entities, synthetic process gauges, and a 20-ticks-per-second loop that
//! occasionally burns a heavy tick so lag-spike detection has something to
//! catch. Implements [`HostProbe`] for the collectors and drives the tick
//! hooks from its own loop.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tickscope::{
    CellPos, GcCounter, HostProbe, ProbeError, SystemSnapshot, TickMonitor, WorldSnapshot,
};

/// Nominal game tick cadence (20 per second).
const TICK_INTERVAL: Duration = Duration::from_millis(50);

const WORLD_NAMES: &[&str] = &["minecraft:overworld", "minecraft:the_nether"];

const ENTITY_TYPES: &[(&str, &str)] = &[
    ("minecraft:zombie", "hostile"),
    ("minecraft:skeleton", "hostile"),
    ("minecraft:creeper", "hostile"),
    ("minecraft:cow", "passive"),
    ("minecraft:sheep", "passive"),
    ("minecraft:item", "item"),
];

const BLOCK_ENTITY_TYPES: &[&str] = &["minecraft:chest", "minecraft:furnace", "minecraft:hopper"];

struct Entity {
    world: usize,
    type_index: usize,
    cell: CellPos,
}

struct SimState {
    rng: StdRng,
    entities: Vec<Entity>,
    tick_count: u64,
    gc_collections: u64,
    gc_time_ms: u64,
}

/// A tiny fake game server.
pub struct SimulatedServer {
    state: Mutex<SimState>,
}

impl SimulatedServer {
    /// Builds a deterministic world population from `seed`.
    pub fn new(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);

        let mut entities = Vec::with_capacity(430);
        for _ in 0..400 {
            entities.push(Entity {
                world: rng.gen_range(0..WORLD_NAMES.len()),
                type_index: rng.gen_range(0..ENTITY_TYPES.len()),
                cell: CellPos {
                    x: rng.gen_range(-8..=8),
                    z: rng.gen_range(-8..=8),
                },
            });
        }
        // A zombie farm packed into one overworld cell, so hotspot
        // detection has something to find.
        for _ in 0..30 {
            entities.push(Entity {
                world: 0,
                type_index: 0,
                cell: CellPos { x: 3, z: -2 },
            });
        }

        Self {
            state: Mutex::new(SimState {
                rng,
                entities,
                tick_count: 0,
                gc_collections: 0,
                gc_time_ms: 0,
            }),
        }
    }

    /// Advances the simulation one tick and returns how much work time the
    /// tick should burn.
    fn advance(&self) -> Duration {
        let mut state = self.state.lock();
        state.tick_count += 1;

        let SimState { rng, entities, .. } = &mut *state;

        // A handful of entities wander to a neighboring cell.
        for _ in 0..16 {
            let index = rng.gen_range(0..entities.len());
            let dx = rng.gen_range(-1..=1);
            let dz = rng.gen_range(-1..=1);
            let entity = &mut entities[index];
            entity.cell.x = (entity.cell.x + dx).clamp(-8, 8);
            entity.cell.z = (entity.cell.z + dz).clamp(-8, 8);
        }

        // GC activity every few seconds of game time.
        if state.tick_count % 120 == 0 {
            state.gc_collections += 1;
            let pause = state.rng.gen_range(5..30);
            state.gc_time_ms += pause;
        }

        // Baseline work plus the occasional heavy tick.
        let work_ms = if state.rng.gen_bool(0.01) {
            state.rng.gen_range(120..400)
        } else {
            state.rng.gen_range(3..35)
        };
        Duration::from_millis(work_ms)
    }

    /// Runs the tick loop forever, bracketing every tick with the monitor.
    pub async fn run(self: Arc<Self>, ticks: Arc<TickMonitor>) {
        let mut clock = tokio::time::interval(TICK_INTERVAL);
        loop {
            clock.tick().await;
            ticks.on_tick_start();
            let work = self.advance();
            tokio::time::sleep(work).await;
            ticks.on_tick_end();
        }
    }
}

impl HostProbe for SimulatedServer {
    fn system(&self) -> Result<SystemSnapshot, ProbeError> {
        let state = self.state.lock();
        let entities = state.entities.len() as u64;
        #[allow(clippy::cast_possible_truncation)] // remainder is below 4
        let thread_wiggle = (state.tick_count % 4) as u32;
        #[allow(clippy::cast_precision_loss)] // remainder is below 20
        let cpu_wiggle = (state.tick_count % 20) as f64;

        Ok(SystemSnapshot {
            memory_used_bytes: 256 * 1024 * 1024
                + entities * 64 * 1024
                + (state.tick_count % 100) * 1024 * 1024,
            memory_committed_bytes: 768 * 1024 * 1024,
            memory_max_bytes: 2 * 1024 * 1024 * 1024,
            threads_current: 18 + thread_wiggle,
            threads_peak: 24,
            cpu_process_pct: Some(15.0 + cpu_wiggle),
            cpu_system_pct: Some(30.0),
            load_average: Some(1.2),
            available_processors: 8,
            gc: vec![GcCounter {
                name: "G1 Young Generation".to_string(),
                collections: state.gc_collections,
                total_time_ms: state.gc_time_ms,
            }],
        })
    }

    fn worlds(&self) -> Result<Vec<WorldSnapshot>, ProbeError> {
        let state = self.state.lock();

        let mut worlds: Vec<WorldSnapshot> = WORLD_NAMES
            .iter()
            .enumerate()
            .map(|(i, name)| WorldSnapshot {
                name: (*name).to_string(),
                loaded_chunks: if i == 0 { 289 } else { 81 },
                ..Default::default()
            })
            .collect();

        for entity in &state.entities {
            let world = &mut worlds[entity.world];
            let (type_id, category) = ENTITY_TYPES[entity.type_index];

            world.entities_total += 1;
            *world
                .entities_by_category
                .entry(category.to_string())
                .or_default() += 1;
            *world
                .entities_by_type
                .entry(type_id.to_string())
                .or_default() += 1;

            let cell = world.entities_by_cell.entry(entity.cell).or_default();
            cell.total += 1;
            *cell.by_type.entry(type_id.to_string()).or_default() += 1;
        }

        for (i, world) in worlds.iter_mut().enumerate() {
            for (j, block_entity) in BLOCK_ENTITY_TYPES.iter().enumerate() {
                world
                    .block_entities_by_type
                    .insert((*block_entity).to_string(), 10 + (i as u64) * 3 + j as u64);
            }
        }

        Ok(worlds)
    }
}
