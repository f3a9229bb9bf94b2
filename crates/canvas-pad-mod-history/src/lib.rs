/// Snapshot-based undo/redo history for canvas documents.
///
/// Provides a `HistoryManager` that debounces document change events into
/// full-document snapshots, keeps them in a linear log with a cursor, and
/// mirrors log and cursor into a key-value store (redb on disk) so history
/// survives across sessions.
pub mod config;
pub mod debounce;
pub mod log;
pub mod manager;
pub mod persistence;
pub mod snapshot;
pub mod surface;

pub use config::HistoryConfig;
pub use debounce::Debouncer;
pub use log::HistoryLog;
pub use manager::{HistoryManager, HistoryStep, Hydration};
pub use persistence::{HistoryStore, KeyValueStore, MemoryStore, RedbStore};
pub use snapshot::Snapshot;
pub use surface::{ChangeEvent, ChangeKind, DocumentSurface};
