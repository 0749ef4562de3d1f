//! Applying single change notifications to the replica.
//!
//! Handlers convert the source-side path to its replica counterpart and
//! perform one filesystem operation. They never return errors: a failure is
//! logged and the next full pass reconciles whatever was left behind.

use std::path::{Path, PathBuf};

use crate::error::{Result, SyncError};
use crate::fs::{EntryKind, LocalFs};
use crate::sync::engine::{EntryStatus, SyncStats, Synchronizer};
use crate::sync::hash::same_content;

/// One change under the source tree, carrying absolute source-side paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    Created(PathBuf),
    Changed(PathBuf),
    Deleted(PathBuf),
    Renamed { from: PathBuf, to: PathBuf },
}

impl ChangeEvent {
    /// The path the event leaves behind (the new path for renames).
    pub fn path(&self) -> &Path {
        match self {
            Self::Created(p) | Self::Changed(p) | Self::Deleted(p) => p,
            Self::Renamed { to, .. } => to,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Created(_) => "OnCreated",
            Self::Changed(_) => "OnChanged",
            Self::Deleted(_) => "OnDeleted",
            Self::Renamed { .. } => "OnRenamed",
        }
    }
}

impl Synchronizer {
    /// Apply one change event. Safe to call again with the same event.
    pub fn apply(&self, event: &ChangeEvent) -> EntryStatus {
        let result = match event {
            ChangeEvent::Created(path) => self.on_created(path),
            ChangeEvent::Changed(path) => self.on_changed(path),
            ChangeEvent::Deleted(path) => self.on_deleted(path),
            ChangeEvent::Renamed { from, to } => self.on_renamed(from, to),
        };

        result.unwrap_or_else(|e| {
            self.sink.error(format!("{} error: {}", event.label(), e));
            EntryStatus::Failed
        })
    }

    /// Replica path for an event path; `None` for the source root itself.
    fn event_target(&self, source_path: &Path) -> Result<Option<PathBuf>> {
        if self.roots.relative(source_path)?.as_os_str().is_empty() {
            return Ok(None);
        }
        self.roots.replica_path(source_path).map(Some)
    }

    fn on_created(&self, path: &Path) -> Result<EntryStatus> {
        let Some(dest) = self.event_target(path)? else {
            return Ok(EntryStatus::Ignored);
        };

        match LocalFs::kind(path) {
            EntryKind::Dir => {
                self.ensure_replica_dir(&dest)?;
                // A directory moved into the tree arrives with its contents.
                let mut stats = SyncStats::default();
                self.mirror(path, &dest, &mut stats)?;
                Ok(EntryStatus::Applied)
            }
            EntryKind::File => {
                LocalFs::copy_file(path, &dest).map_err(|e| SyncError::io("copying", path, e))?;
                self.sink.info(format!(
                    "File created: {} -> {}",
                    path.display(),
                    dest.display()
                ));
                Ok(EntryStatus::Applied)
            }
            EntryKind::Other | EntryKind::Missing => Ok(EntryStatus::Ignored),
        }
    }

    fn on_changed(&self, path: &Path) -> Result<EntryStatus> {
        let Some(dest) = self.event_target(path)? else {
            return Ok(EntryStatus::Ignored);
        };

        if !LocalFs::kind(path).is_file() {
            return Ok(EntryStatus::Ignored);
        }

        LocalFs::copy_file(path, &dest).map_err(|e| SyncError::io("copying", path, e))?;
        self.sink.info(format!(
            "File changed: {} -> {}",
            path.display(),
            dest.display()
        ));
        Ok(EntryStatus::Applied)
    }

    fn on_deleted(&self, path: &Path) -> Result<EntryStatus> {
        let Some(dest) = self.event_target(path)? else {
            return Ok(EntryStatus::Ignored);
        };

        let removed = LocalFs::remove(&dest).map_err(|e| SyncError::io("deleting", &dest, e))?;
        match removed {
            EntryKind::Dir => {
                self.sink
                    .info(format!("Directory deleted: {}", dest.display()));
                Ok(EntryStatus::Applied)
            }
            EntryKind::File | EntryKind::Other => {
                self.sink.info(format!("File deleted: {}", dest.display()));
                Ok(EntryStatus::Applied)
            }
            EntryKind::Missing => Ok(EntryStatus::Ignored),
        }
    }

    fn on_renamed(&self, from: &Path, to: &Path) -> Result<EntryStatus> {
        // Moves across the edge of the source tree degrade to create/delete.
        let old_dest = match self.event_target(from) {
            Ok(Some(dest)) => dest,
            Ok(None) => return Ok(EntryStatus::Ignored),
            Err(SyncError::OutsideSource { .. }) => return self.on_created(to),
            Err(e) => return Err(e),
        };
        let new_dest = match self.event_target(to) {
            Ok(Some(dest)) => dest,
            Ok(None) => return Ok(EntryStatus::Ignored),
            Err(SyncError::OutsideSource { .. }) => return self.on_deleted(from),
            Err(e) => return Err(e),
        };

        match LocalFs::kind(&old_dest) {
            EntryKind::Dir => {
                LocalFs::rename(&old_dest, &new_dest)
                    .map_err(|e| SyncError::io("renaming", &old_dest, e))?;
                self.sink.info(format!(
                    "Directory renamed: {} -> {}",
                    old_dest.display(),
                    new_dest.display()
                ));
                Ok(EntryStatus::Applied)
            }
            EntryKind::File => {
                LocalFs::rename(&old_dest, &new_dest)
                    .map_err(|e| SyncError::io("renaming", &old_dest, e))?;
                self.sink.info(format!(
                    "File renamed: {} -> {}",
                    old_dest.display(),
                    new_dest.display()
                ));
                Ok(EntryStatus::Applied)
            }
            // Old copy never made it to the replica (or was already moved).
            EntryKind::Other | EntryKind::Missing => {
                if self.already_mirrored(to, &new_dest)? {
                    return Ok(EntryStatus::Unchanged);
                }
                self.on_created(to)
            }
        }
    }

    /// Whether `dest` already reflects `path`: the same directory, or a file
    /// with the same bytes.
    fn already_mirrored(&self, path: &Path, dest: &Path) -> Result<bool> {
        match (LocalFs::kind(path), LocalFs::kind(dest)) {
            (EntryKind::Dir, EntryKind::Dir) => Ok(true),
            (EntryKind::File, EntryKind::File) => same_content(path, dest, self.hash)
                .map_err(|e| SyncError::io("comparing", path, e)),
            _ => Ok(false),
        }
    }
}
