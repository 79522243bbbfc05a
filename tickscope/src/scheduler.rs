//! Fixed-rate collection scheduler.
//!
//! The scheduler drives the whole pipeline: every interval it stamps a
//! timestamp, feeds the latest tick duration into the statistics engine,
//! and fans the collectors out across the runtime, one task each. Cadence
//! is fixed-rate, not fixed-delay: cycle N+1 is due `interval` after cycle
//! N *started*, so collection does not drift when the host is loaded.
//! Cycles are never awaited before the next one fires, which means they
//! can overlap; collectors must tolerate that (see
//! [`Collector`](crate::collect::Collector)).
//!
//! The lifecycle is one-way: `Idle` until [`Scheduler::start`], `Running`
//! until [`Scheduler::stop`], then permanently `Stopped`. Both transitions
//! are idempotent and misuse is a logged no-op, never an error.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

use crate::collect::Collector;
use crate::host::{HostProbe, TickMonitor};
use crate::sample::now_millis;
use crate::stats::{self, StatisticsEngine};
use crate::store::SeriesStore;

/// How long [`Scheduler::stop`] waits for in-flight collection before
/// force-cancelling it.
pub const STOP_GRACE: Duration = Duration::from_secs(5);

/// Drives collection cycles at a fixed cadence.
pub struct Scheduler {
    store: Arc<SeriesStore>,
    stats: Arc<StatisticsEngine>,
    ticks: Arc<TickMonitor>,
    host: Arc<dyn HostProbe>,
    collectors: Vec<Arc<dyn Collector>>,
    lifecycle: Mutex<Lifecycle>,
}

enum Lifecycle {
    Idle,
    Running {
        shutdown: watch::Sender<bool>,
        driver: JoinHandle<()>,
    },
    Stopped,
}

impl Scheduler {
    /// Wires a scheduler to its dependencies. Nothing runs until
    /// [`start`](Self::start).
    pub fn new(
        store: Arc<SeriesStore>,
        stats: Arc<StatisticsEngine>,
        ticks: Arc<TickMonitor>,
        host: Arc<dyn HostProbe>,
        collectors: Vec<Arc<dyn Collector>>,
    ) -> Self {
        Self {
            store,
            stats,
            ticks,
            host,
            collectors,
            lifecycle: Mutex::new(Lifecycle::Idle),
        }
    }

    /// Begins firing cycles every `interval`. The first cycle fires
    /// immediately. Calling this while running, or after [`stop`](Self::stop),
    /// is a logged no-op.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn start(&self, interval: Duration) {
        let mut lifecycle = self.lifecycle.lock();
        match *lifecycle {
            Lifecycle::Running { .. } => {
                debug!("scheduler already running, ignoring start");
            }
            Lifecycle::Stopped => {
                debug!("scheduler is stopped and cannot be restarted");
            }
            Lifecycle::Idle => {
                #[allow(clippy::cast_possible_truncation)] // display only
                let interval_ms = interval.as_millis() as u64;
                info!(interval_ms, collectors = self.collectors.len(), "starting metric collection");

                let (shutdown, signal) = watch::channel(false);
                let driver = tokio::spawn(run_cycles(
                    Arc::clone(&self.store),
                    Arc::clone(&self.stats),
                    Arc::clone(&self.ticks),
                    Arc::clone(&self.host),
                    self.collectors.clone(),
                    interval,
                    signal,
                ));
                *lifecycle = Lifecycle::Running { shutdown, driver };
            }
        }
    }

    /// Stops the cadence, waits up to [`STOP_GRACE`] for in-flight
    /// collection to drain, then force-cancels whatever remains.
    /// Idempotent and one-way; the scheduler never resumes.
    pub async fn stop(&self) {
        let previous = {
            let mut lifecycle = self.lifecycle.lock();
            std::mem::replace(&mut *lifecycle, Lifecycle::Stopped)
        };

        if let Lifecycle::Running { shutdown, driver } = previous {
            let _ = shutdown.send(true);

            let mut driver = driver;
            match tokio::time::timeout(STOP_GRACE, &mut driver).await {
                Ok(Ok(())) => info!("metric collection stopped"),
                Ok(Err(e)) => error!("collection driver failed during shutdown: {e}"),
                Err(_) => {
                    driver.abort();
                    warn!(
                        grace_secs = STOP_GRACE.as_secs(),
                        "in-flight collection outlived the grace period, cancelled"
                    );
                }
            }
        }
    }

    /// Whether the scheduler is currently firing cycles.
    pub fn is_running(&self) -> bool {
        matches!(*self.lifecycle.lock(), Lifecycle::Running { .. })
    }
}

async fn run_cycles(
    store: Arc<SeriesStore>,
    stats: Arc<StatisticsEngine>,
    ticks: Arc<TickMonitor>,
    host: Arc<dyn HostProbe>,
    collectors: Vec<Arc<dyn Collector>>,
    interval: Duration,
    mut signal: watch::Receiver<bool>,
) {
    let mut clock = tokio::time::interval(interval);
    // Fixed-rate cadence: if a cycle fires late, later cycles stay on the
    // original schedule instead of shifting with the delay.
    clock.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Burst);

    let mut inflight: JoinSet<()> = JoinSet::new();

    loop {
        tokio::select! {
            _ = clock.tick() => {
                // Reap finished tasks; a panic in one collector surfaces
                // here and affects nothing else.
                while let Some(result) = inflight.try_join_next() {
                    if let Err(e) = result {
                        if e.is_panic() {
                            error!("collector task panicked: {e}");
                        }
                    }
                }

                let timestamp = now_millis();

                if let Some(tick_ms) = ticks.last_tick_ms() {
                    stats.observe(&store, timestamp, tick_ms);
                }
                if let Some(avg_ms) = ticks.average_tick_ms() {
                    store.record("server.tps", timestamp, stats::estimate_tps(avg_ms));
                }

                for collector in &collectors {
                    let store = Arc::clone(&store);
                    let host = Arc::clone(&host);
                    let collector = Arc::clone(collector);
                    inflight.spawn(async move {
                        if let Err(e) = collector.collect(&store, host.as_ref(), timestamp) {
                            error!(collector = collector.name(), "collector failed: {e}");
                        }
                    });
                }
            }
            _ = signal.changed() => break,
        }
    }

    // Drain in-flight collection; stop() bounds how long this gets.
    while inflight.join_next().await.is_some() {}
}
