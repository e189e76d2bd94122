pub mod snapshot;

pub use snapshot::{RepoSummary, SnapshotRecord, SnapshotStore};
