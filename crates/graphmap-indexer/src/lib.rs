//! GraphMap Indexer
//!
//! This crate provides the folder index engine for GraphMap, including:
//! - Canonical naming of generated index files
//! - Post-order planning of per-folder link lists over a vault snapshot
//! - Content-diffing index writes (create / update / no-op)
//! - Full-tree synchronization passes with a single-flight run lock
//! - Change filtering and trailing-edge debouncing of resync triggers
//! - File watching that turns native events into vault changes

mod config;
mod error;
pub mod gate;
pub mod naming;
pub mod sync;
pub mod tree;
pub mod vault;
pub mod watcher;
pub mod writer;

pub use config::SyncConfig;
pub use error::IndexerError;
pub use gate::ChangeGate;
pub use sync::{SyncOrchestrator, SyncReport};
pub use tree::{DocumentNode, FolderPlan, LinkEntry, LinkKind, NodeKind, TreeWalker};
pub use vault::{EntryKind, FsVault, MemoryVault, VaultStore};
pub use watcher::{ChangeKind, VaultChange, VaultWatcher, WatcherOptions};
pub use writer::{IndexWriter, WriteOutcome};
