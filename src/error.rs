//! Error types for synchronization.

use std::io;
use std::path::PathBuf;

/// Result type for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors surfaced by the synchronization engine.
///
/// `SourceMissing` is fatal to a full pass and kept distinct so callers can
/// tell it apart from the per-entry `Io` failures that a pass logs and skips.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Source not found: {}", .path.display())]
    SourceMissing { path: PathBuf },

    #[error("I/O error while {operation} {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        operation: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("Path is outside the source tree: {}", .path.display())]
    OutsideSource { path: PathBuf },

    #[error(
        "Source and replica must not contain each other: {} and {}",
        .source_root.display(),
        .replica_root.display()
    )]
    OverlappingRoots {
        source_root: PathBuf,
        replica_root: PathBuf,
    },

    #[error("Watcher error: {0}")]
    Watch(#[from] notify::Error),
}

impl SyncError {
    /// Wrap an `io::Error` with the path and operation it failed on.
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            operation,
            source,
        }
    }

    /// Whether this error means the source root is gone.
    pub fn is_source_missing(&self) -> bool {
        matches!(self, Self::SourceMissing { .. })
    }
}
