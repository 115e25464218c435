pub mod db;
pub mod models;
pub mod snapshot;

pub use db::{CreateOutcome, Database};
pub use models::{ExclusiveHolder, HolderBalance, HolderSnapshot, OpenTrade, OpenTradeType};
pub use snapshot::{FileSnapshotStore, MemorySnapshotStore, SnapshotKind, SnapshotStore};
