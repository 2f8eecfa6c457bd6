pub mod connectivity;
pub mod snapshot;
pub mod store;

pub use connectivity::{ConnectivityChange, ConnectivityMonitor, ConnectivityProbe, TcpConnectivityProbe};
pub use snapshot::{DraftCursor, DraftSnapshot, DRAFT_KEY, DRAFT_VERSION};
pub use store::{DraftStorage, DraftStore, PersistReason, RestoredDraft, SnapshotSource};
