//! Fixed-capacity ring buffer for one metric's samples.
//!
//! Each named metric owns one [`RingBuffer`]. Memory is bounded by
//! construction: once `capacity` samples have been written, every further
//! write silently overwrites the oldest slot. This keeps the write path
//! O(1) and allocation-free after warm-up, at the cost of history depth.
//!
//! # Concurrency
//!
//! The buffer is shared between one writer stream (collection cycles) and
//! any number of readers (query handlers). A `parking_lot::RwLock` guards
//! the slots: reads run concurrently with each other, a write excludes all
//! reads for the duration of one slot update, and snapshots copy the slots
//! out under the read lock so no caller ever iterates a mutating buffer.

use parking_lot::RwLock;

use crate::sample::Sample;

/// Fixed-capacity circular buffer holding the most recent samples of one
/// series in insertion order.
#[derive(Debug)]
pub struct RingBuffer {
    inner: RwLock<RingState>,
    capacity: usize,
}

#[derive(Debug)]
struct RingState {
    /// Stored samples. Grows up to capacity, then slots are reused in place.
    slots: Vec<Sample>,
    /// Next slot to overwrite once the buffer has filled.
    head: usize,
}

impl RingBuffer {
    /// Creates an empty buffer with room for `capacity` samples.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero. The store validates its configuration
    /// before constructing buffers, so this fires only on misuse.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring buffer capacity must be non-zero");
        Self {
            inner: RwLock::new(RingState {
                slots: Vec::with_capacity(capacity),
                head: 0,
            }),
            capacity,
        }
    }

    /// Appends a sample, overwriting the oldest entry once full.
    ///
    /// Always succeeds; overflow is not an error. The critical section is
    /// a single slot write.
    pub fn add(&self, sample: Sample) {
        let mut state = self.inner.write();
        if state.slots.len() < self.capacity {
            state.slots.push(sample);
        } else {
            let head = state.head;
            state.slots[head] = sample;
            state.head = (head + 1) % self.capacity;
        }
    }

    /// Returns every held sample, oldest first, as one consistent copy.
    pub fn snapshot(&self) -> Vec<Sample> {
        let state = self.inner.read();
        if state.slots.len() < self.capacity {
            state.slots.clone()
        } else {
            // Full buffer: chronological order starts at the head slot.
            let mut out = Vec::with_capacity(self.capacity);
            out.extend_from_slice(&state.slots[state.head..]);
            out.extend_from_slice(&state.slots[..state.head]);
            out
        }
    }

    /// Samples with `start <= timestamp <= end`, oldest first.
    ///
    /// Filters a snapshot rather than the live slots, so a concurrent
    /// writer cannot mutate the buffer mid-scan.
    pub fn snapshot_range(&self, start: u64, end: u64) -> Vec<Sample> {
        self.snapshot()
            .into_iter()
            .filter(|s| s.timestamp >= start && s.timestamp <= end)
            .collect()
    }

    /// The most recently added sample, if any.
    pub fn latest(&self) -> Option<Sample> {
        let state = self.inner.read();
        if state.slots.is_empty() {
            None
        } else if state.slots.len() < self.capacity {
            state.slots.last().copied()
        } else {
            Some(state.slots[(state.head + self.capacity - 1) % self.capacity])
        }
    }

    /// Number of samples currently held.
    pub fn len(&self) -> usize {
        self.inner.read().slots.len()
    }

    /// Returns `true` if nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.inner.read().slots.is_empty()
    }

    /// The fixed slot count this buffer was created with.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
