mod snapshot_collector;

pub use snapshot_collector::{Snapshot, SnapshotCollector, SnapshotStatus};
