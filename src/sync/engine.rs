//! Full-pass synchronization engine.
//!
//! A full pass mirrors the source tree into the replica (add/update only),
//! then cleans up replica entries that no longer exist in the source
//! (remove only). Each directory level is listed on its own and descended
//! into top-down.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::error::{Result, SyncError};
use crate::fs::LocalFs;
use crate::logging::LogSink;
use crate::sync::hash::{same_content, HashType};
use crate::sync::paths::Roots;

/// Outcome of visiting one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    /// The replica was changed.
    Applied,
    /// The replica already matched.
    Unchanged,
    /// Nothing to do for this entry.
    Ignored,
    /// An error was logged and the entry skipped.
    Failed,
}

/// Counters for one full pass.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    pub files_copied: usize,
    pub files_unchanged: usize,
    pub dirs_created: usize,
    pub files_deleted: usize,
    pub dirs_deleted: usize,
    pub errors: usize,
    pub duration_ms: u64,
}

impl SyncStats {
    /// Number of replica mutations made during the pass.
    pub fn changes(&self) -> usize {
        self.files_copied + self.dirs_created + self.files_deleted + self.dirs_deleted
    }
}

/// Keeps a replica tree identical to a source tree.
///
/// Cheap to clone; clones share the roots and the log sink, so a full pass
/// and event handlers can run on different threads at the same time.
#[derive(Clone)]
pub struct Synchronizer {
    pub(super) roots: Arc<Roots>,
    pub(super) hash: HashType,
    pub(super) sink: Arc<dyn LogSink>,
}

impl std::fmt::Debug for Synchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Synchronizer")
            .field("roots", &self.roots)
            .field("hash", &self.hash)
            .finish_non_exhaustive()
    }
}

impl Synchronizer {
    /// Create a synchronizer using the default hash.
    pub fn new(roots: Roots, sink: Arc<dyn LogSink>) -> Self {
        Self {
            roots: Arc::new(roots),
            hash: HashType::default(),
            sink,
        }
    }

    /// Use a different content digest.
    pub fn with_hash(mut self, hash: HashType) -> Self {
        self.hash = hash;
        self
    }

    pub fn roots(&self) -> &Roots {
        &self.roots
    }

    pub fn hash(&self) -> HashType {
        self.hash
    }

    pub fn sink(&self) -> &dyn LogSink {
        self.sink.as_ref()
    }

    /// Run one full pass: mirror, then cleanup.
    ///
    /// Fails only when the source root is missing or one of the two roots
    /// cannot be listed; errors on individual entries are logged, counted
    /// and skipped.
    pub fn synchronize(&self) -> Result<SyncStats> {
        let started = Instant::now();
        let source = self.roots.source();
        let replica = self.roots.replica();

        if !LocalFs::kind(source).is_dir() {
            return Err(SyncError::SourceMissing {
                path: source.to_path_buf(),
            });
        }

        let mut stats = SyncStats::default();
        if self.ensure_replica_dir(replica)? {
            stats.dirs_created += 1;
        }

        self.mirror(source, replica, &mut stats)?;
        self.cleanup(source, replica, &mut stats)?;

        stats.duration_ms = started.elapsed().as_millis() as u64;
        self.sink.info("Full synchronization complete.".to_string());
        Ok(stats)
    }

    /// Make `replica_dir` match the files and subdirectories of `source_dir`.
    pub(super) fn mirror(
        &self,
        source_dir: &Path,
        replica_dir: &Path,
        stats: &mut SyncStats,
    ) -> Result<()> {
        let listing = LocalFs::list_dir(source_dir)
            .map_err(|e| SyncError::io("reading directory", source_dir, e))?;

        for name in &listing.files {
            let source_file = source_dir.join(name);
            let replica_file = replica_dir.join(name);
            match self.mirror_file(&source_file, &replica_file) {
                EntryStatus::Applied => stats.files_copied += 1,
                EntryStatus::Unchanged => stats.files_unchanged += 1,
                EntryStatus::Failed => stats.errors += 1,
                EntryStatus::Ignored => {}
            }
        }

        for name in &listing.dirs {
            let source_sub = source_dir.join(name);
            let replica_sub = replica_dir.join(name);

            match self.ensure_replica_dir(&replica_sub) {
                Ok(true) => stats.dirs_created += 1,
                Ok(false) => {}
                Err(e) => {
                    self.sink.error(e.to_string());
                    stats.errors += 1;
                    continue;
                }
            }

            if let Err(e) = self.mirror(&source_sub, &replica_sub, stats) {
                self.sink.error(e.to_string());
                stats.errors += 1;
            }
        }

        Ok(())
    }

    /// Copy one file unless the replica already holds the same bytes.
    fn mirror_file(&self, source_file: &Path, replica_file: &Path) -> EntryStatus {
        self.copy_if_changed(source_file, replica_file)
            .unwrap_or_else(|e| {
                self.sink.error(e.to_string());
                EntryStatus::Failed
            })
    }

    fn copy_if_changed(&self, source_file: &Path, replica_file: &Path) -> Result<EntryStatus> {
        if LocalFs::kind(replica_file).is_file() {
            let same = same_content(source_file, replica_file, self.hash)
                .map_err(|e| SyncError::io("comparing", source_file, e))?;
            if same {
                return Ok(EntryStatus::Unchanged);
            }
        }

        LocalFs::copy_file(source_file, replica_file)
            .map_err(|e| SyncError::io("copying", source_file, e))?;
        self.sink.info(format!(
            "Copied: {} -> {}",
            source_file.display(),
            replica_file.display()
        ));
        Ok(EntryStatus::Applied)
    }

    /// Remove everything under `replica_dir` with no counterpart in `source_dir`.
    pub(super) fn cleanup(
        &self,
        source_dir: &Path,
        replica_dir: &Path,
        stats: &mut SyncStats,
    ) -> Result<()> {
        let listing = LocalFs::list_dir(replica_dir)
            .map_err(|e| SyncError::io("reading directory", replica_dir, e))?;

        for name in &listing.files {
            if LocalFs::kind(&source_dir.join(name)).is_file() {
                continue;
            }
            let replica_file = replica_dir.join(name);
            match LocalFs::remove(&replica_file) {
                Ok(_) => {
                    self.sink
                        .info(format!("Deleted file: {}", replica_file.display()));
                    stats.files_deleted += 1;
                }
                Err(e) => {
                    self.sink
                        .error(SyncError::io("deleting", &replica_file, e).to_string());
                    stats.errors += 1;
                }
            }
        }

        for name in &listing.dirs {
            let source_sub = source_dir.join(name);
            let replica_sub = replica_dir.join(name);

            if LocalFs::kind(&source_sub).is_dir() {
                if let Err(e) = self.cleanup(&source_sub, &replica_sub, stats) {
                    self.sink.error(e.to_string());
                    stats.errors += 1;
                }
                continue;
            }

            match LocalFs::remove(&replica_sub) {
                Ok(_) => {
                    self.sink
                        .info(format!("Deleted directory: {}", replica_sub.display()));
                    stats.dirs_deleted += 1;
                }
                Err(e) => {
                    self.sink
                        .error(SyncError::io("deleting", &replica_sub, e).to_string());
                    stats.errors += 1;
                }
            }
        }

        Ok(())
    }

    /// Create a replica directory if needed, logging when it was created.
    pub(super) fn ensure_replica_dir(&self, path: &Path) -> Result<bool> {
        let created = LocalFs::ensure_dir(path)
            .map_err(|e| SyncError::io("creating directory", path, e))?;
        if created {
            self.sink
                .info(format!("Directory created: {}", path.display()));
        }
        Ok(created)
    }
}
