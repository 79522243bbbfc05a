//! Integration tests for the series store and its ring buffers.

use std::sync::Arc;

use tickscope::{Sample, SeriesStore};

#[test]
fn test_bounded_memory_property() {
    // For a capacity-C buffer, any N >= C inserts leave exactly the last C
    // samples, in insertion order.
    const CAPACITY: usize = 100;
    for n in [100u64, 101, 150, 1_000] {
        let store = SeriesStore::new(CAPACITY, 8);
        for i in 0..n {
            store.record("series", i, i as f64);
        }

        let snapshot = store.get("series");
        assert_eq!(snapshot.len(), CAPACITY);
        let expected: Vec<Sample> = (n - CAPACITY as u64..n)
            .map(|i| Sample::new(i, i as f64))
            .collect();
        assert_eq!(snapshot, expected, "n = {n}");
    }
}

#[test]
fn test_order_preservation_below_capacity() {
    let store = SeriesStore::new(100, 8);
    for i in 0..42u64 {
        store.record("series", i * 10, i as f64);
    }

    let snapshot = store.get("series");
    assert_eq!(snapshot.len(), 42);
    assert!(
        snapshot
            .windows(2)
            .all(|pair| pair[0].timestamp < pair[1].timestamp)
    );
}

#[test]
fn test_empty_query_is_idempotent() {
    let store = SeriesStore::new(16, 8);
    store.record("exists", 1000, 1.0);

    for _ in 0..3 {
        assert!(store.get("does.not.exist").is_empty());
    }
    // The failed lookups created nothing.
    assert_eq!(store.names(), vec!["exists"]);
}

#[test]
fn test_dynamic_keys_respect_cap() {
    let store = SeriesStore::new(16, 10);

    // A hotspot storm mints far more names than the cap admits.
    for cell in 0..100 {
        store.record(&format!("world.overworld.hotspot.{cell}.0.total"), 1000, 30.0);
    }

    assert_eq!(store.series_count(), 10);
    // Capped names keep recording fine.
    store.record("world.overworld.hotspot.0.0.total", 2000, 31.0);
    assert_eq!(store.get("world.overworld.hotspot.0.0.total").len(), 2);
}

#[test]
fn test_raw_host_identifiers_become_valid_keys() {
    let store = SeriesStore::new(16, 8);
    store.record("world.minecraft:the_nether.entities.total", 1000, 7.0);

    let names = store.names();
    assert_eq!(names, vec!["world.minecraft_the_nether.entities.total"]);
    assert!(
        names[0]
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || ".-_".contains(c))
    );
}

// Concurrent writers across distinct series plus readers over the whole
// store: snapshots must never contain a torn sample. Values encode their
// timestamps so corruption is detectable.
#[test]
fn test_concurrent_writers_and_readers() {
    const WRITERS: u64 = 4;
    const PER_WRITER: u64 = 2_000;

    let store = Arc::new(SeriesStore::new(PER_WRITER as usize, 16));

    let mut handles = Vec::new();
    for w in 0..WRITERS {
        let store = Arc::clone(&store);
        handles.push(std::thread::spawn(move || {
            let name = format!("writer.{w}");
            for i in 0..PER_WRITER {
                store.record(&name, i, i as f64);
            }
        }));
    }
    for _ in 0..2 {
        let store = Arc::clone(&store);
        handles.push(std::thread::spawn(move || {
            for _ in 0..100 {
                for (_, samples) in store.get_all() {
                    for s in samples {
                        assert_eq!(s.value, s.timestamp as f64, "torn read");
                    }
                }
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.series_count(), WRITERS as usize);
    for w in 0..WRITERS {
        let samples = store.get(&format!("writer.{w}"));
        assert_eq!(samples.len(), PER_WRITER as usize);
        assert!(
            samples
                .windows(2)
                .all(|pair| pair[0].timestamp < pair[1].timestamp)
        );
    }
}
