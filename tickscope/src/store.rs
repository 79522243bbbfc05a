//! Series store: one ring buffer per metric name.
//!
//! The store owns every [`RingBuffer`] for the lifetime of the process.
//! Buffers are created lazily on the first write to an unseen name and all
//! share one configured capacity, so total memory is bounded by
//! `max_series * history_size` samples.
//!
//! # Locking
//!
//! The name map sits behind a `RwLock`. Steady-state writes take the map
//! read lock just long enough to clone the buffer's `Arc`, then contend
//! only on that buffer's own lock, so collectors writing different series
//! do not serialize against each other. Creating a new series takes the
//! map write lock and re-checks under it, so a racing pair of collectors
//! cannot mint two buffers for one name.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::ring::RingBuffer;
use crate::sample::{Sample, sanitize_key};

/// Owns all time series, keyed by sanitized metric name.
#[derive(Debug)]
pub struct SeriesStore {
    buffers: RwLock<HashMap<String, Arc<RingBuffer>>>,
    capacity: usize,
    max_series: usize,
}

impl SeriesStore {
    /// Creates an empty store.
    ///
    /// `capacity` is the per-series sample retention; `max_series` bounds
    /// the number of distinct names (hotspot series mint names from live
    /// activity, so the key space would otherwise grow without limit).
    pub fn new(capacity: usize, max_series: usize) -> Self {
        Self {
            buffers: RwLock::new(HashMap::new()),
            capacity,
            max_series,
        }
    }

    /// Records one sample, creating the series on first write.
    ///
    /// The name is sanitized to `[A-Za-z0-9._-]`. At the series cap,
    /// samples for previously-unseen names are dropped and logged rather
    /// than evicting another series' history. Never fails or blocks beyond
    /// the buffer's own write lock.
    pub fn record(&self, name: &str, timestamp: u64, value: f64) {
        let name = sanitize_key(name);

        // Fast path: the series already exists.
        let existing = self.buffers.read().get(name.as_ref()).cloned();
        let buffer = match existing {
            Some(buffer) => buffer,
            None => {
                let mut map = self.buffers.write();
                // Re-check: another writer may have created it meanwhile.
                match map.get(name.as_ref()) {
                    Some(buffer) => Arc::clone(buffer),
                    None => {
                        if map.len() >= self.max_series {
                            tracing::warn!(
                                series = name.as_ref(),
                                cap = self.max_series,
                                "series cap reached, dropping sample for new name"
                            );
                            return;
                        }
                        let buffer = Arc::new(RingBuffer::new(self.capacity));
                        map.insert(name.into_owned(), Arc::clone(&buffer));
                        buffer
                    }
                }
            }
        };

        buffer.add(Sample::new(timestamp, value));
    }

    /// Snapshot of one series, oldest first. Unknown names yield an empty
    /// vec, never an error.
    pub fn get(&self, name: &str) -> Vec<Sample> {
        let name = sanitize_key(name);
        match self.buffers.read().get(name.as_ref()) {
            Some(buffer) => buffer.snapshot(),
            None => Vec::new(),
        }
    }

    /// The most recent sample of one series, if any.
    pub fn latest(&self, name: &str) -> Option<Sample> {
        let name = sanitize_key(name);
        self.buffers.read().get(name.as_ref())?.latest()
    }

    /// Snapshots of every series. Each series is snapshotted
    /// independently; there is no cross-series atomicity.
    pub fn get_all(&self) -> HashMap<String, Vec<Sample>> {
        let map = self.buffers.read();
        map.iter()
            .map(|(name, buffer)| (name.clone(), buffer.snapshot()))
            .collect()
    }

    /// Snapshots of every series whose name starts with `prefix`.
    pub fn get_by_prefix(&self, prefix: &str) -> HashMap<String, Vec<Sample>> {
        let map = self.buffers.read();
        map.iter()
            .filter(|(name, _)| name.starts_with(prefix))
            .map(|(name, buffer)| (name.clone(), buffer.snapshot()))
            .collect()
    }

    /// All known metric names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.buffers.read().keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Number of distinct series currently held.
    pub fn series_count(&self) -> usize {
        self.buffers.read().len()
    }

    /// Per-series sample retention.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Configured cap on distinct series names.
    pub fn max_series(&self) -> usize {
        self.max_series
    }
}
