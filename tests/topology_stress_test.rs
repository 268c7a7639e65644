//! Concurrency tests for shared topology snapshots.
//!
//! Readers pin snapshots while a publisher keeps swapping in new ones; a
//! torn or prematurely freed snapshot would show up as an internal
//! inconsistency between a snapshot's version and its contents.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use docdb_auth::{ServerAddress, ServerDescription, SharedTopology, TopologySnapshot};

/// Build a snapshot whose contents are derived from its version, so any
/// torn read is detectable.
fn consistent_snapshot(version: u64) -> TopologySnapshot {
    let mut snapshot = TopologySnapshot::new(version);
    for n in 0..4_u16 {
        snapshot = snapshot.with_server(
            ServerDescription::new(ServerAddress::new(format!("node{n}.example.com"), 27017))
                .with_max_wire_version(version as i32),
        );
    }
    snapshot
}

fn assert_consistent(snapshot: &TopologySnapshot) {
    assert_eq!(snapshot.len(), 4);
    for description in snapshot.servers() {
        assert_eq!(
            description.max_wire_version as u64,
            snapshot.version(),
            "snapshot contents do not match its version"
        );
    }
}

#[test]
fn concurrent_acquire_and_publish_never_tears() {
    let topology = Arc::new(SharedTopology::new(consistent_snapshot(0)));
    let stop = Arc::new(AtomicBool::new(false));

    let publisher = {
        let topology = Arc::clone(&topology);
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            let mut version = 1_u64;
            while !stop.load(Ordering::Relaxed) {
                topology.publish(consistent_snapshot(version));
                version += 1;
            }
            version
        })
    };

    let readers: Vec<_> = (0..8)
        .map(|_| {
            let topology = Arc::clone(&topology);
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                let mut acquired = 0_u64;
                let mut last_seen = 0_u64;
                while !stop.load(Ordering::Relaxed) {
                    let snapshot = topology.acquire();
                    assert_consistent(&snapshot);
                    // Published versions are observed in non-decreasing order.
                    assert!(snapshot.version() >= last_seen);
                    last_seen = snapshot.version();
                    acquired += 1;
                }
                acquired
            })
        })
        .collect();

    thread::sleep(std::time::Duration::from_millis(200));
    stop.store(true, Ordering::Relaxed);

    let published = publisher.join().unwrap();
    let mut total_acquired = 0;
    for reader in readers {
        total_acquired += reader.join().unwrap();
    }
    assert!(published > 1);
    assert!(total_acquired > 0);
}

#[test]
fn pinned_snapshot_outlives_many_publishes() {
    let topology = SharedTopology::new(consistent_snapshot(1));
    let pinned = topology.acquire();

    for version in 2..200 {
        topology.publish(consistent_snapshot(version));
    }

    // The pinned handle still reads its original, consistent data.
    assert_eq!(pinned.version(), 1);
    assert_consistent(&pinned);
    assert_eq!(topology.acquire().version(), 199);
}

#[test]
fn refcounts_return_to_baseline_after_release() {
    let topology = SharedTopology::new(consistent_snapshot(1));

    let baseline = Arc::strong_count(&topology.acquire());
    {
        let _a = topology.acquire();
        let _b = topology.acquire();
        assert!(Arc::strong_count(&_a) > baseline);
    }
    // Every acquire has been matched by a release (drop).
    assert_eq!(Arc::strong_count(&topology.acquire()), baseline);
}
