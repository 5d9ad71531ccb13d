//! Snapshot history for the bhav analytics system.
//!
//! This crate handles:
//! - Snapshot stores (in-memory, directory of CSV files, SQLite)
//! - Selecting the window of trading days behind one comparison
//! - Fetching and parsing a window concurrently, tolerating per-file failures
//! - Retention of stored uploads

pub mod loader;
pub mod sqlite;
pub mod store;
pub mod window;

pub use loader::{HistoryLoader, HistoryReport, PooledHistory};
pub use sqlite::SqliteSnapshotStore;
pub use store::{DirectorySnapshotStore, MemorySnapshotStore, SnapshotStore};
pub use window::{retention_cutoff, select_window, SnapshotAnchor};
