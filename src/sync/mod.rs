//! Sync & Replication Module
//!
//! One-way replication of a source tree into a replica tree: full
//! mirror-and-cleanup passes plus real-time application of change events.

pub mod engine;
pub mod events;
pub mod hash;
pub mod paths;
pub mod watcher;

pub use engine::{EntryStatus, SyncStats, Synchronizer};
pub use events::ChangeEvent;
pub use hash::{fingerprint, same_content, Fingerprint, HashType};
pub use paths::Roots;
pub use watcher::{ChangeSource, EventTranslator, FsWatcher};
