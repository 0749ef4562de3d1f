use std::fs;
use std::io;
use std::path::Path;

use crate::fs::types::{DirListing, EntryKind};

/// Single-step operations on the local filesystem.
///
/// Every operation is safe to repeat: creating something that exists or
/// removing something already gone succeeds without doing anything.
pub struct LocalFs;

impl LocalFs {
    /// Kind of entry at `path`.
    ///
    /// A symlink to a file counts as that file. A symlink to a directory is
    /// `Other`, so tree walks never descend through links and cannot loop.
    pub fn kind(path: &Path) -> EntryKind {
        let is_link = match fs::symlink_metadata(path) {
            Ok(meta) => meta.file_type().is_symlink(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return EntryKind::Missing,
            Err(_) => return EntryKind::Other,
        };

        match fs::metadata(path) {
            Ok(meta) if meta.is_dir() && !is_link => EntryKind::Dir,
            Ok(meta) if meta.is_file() => EntryKind::File,
            // Dangling links and special files.
            _ => EntryKind::Other,
        }
    }

    /// List one directory level, partitioned into files and subdirectories.
    pub fn list_dir(path: &Path) -> io::Result<DirListing> {
        let mut listing = DirListing::default();

        for entry in fs::read_dir(path)? {
            let entry = entry?;
            match Self::kind(&entry.path()) {
                EntryKind::File => listing.files.push(entry.file_name()),
                EntryKind::Dir => listing.dirs.push(entry.file_name()),
                EntryKind::Other | EntryKind::Missing => {}
            }
        }

        listing.files.sort();
        listing.dirs.sort();
        Ok(listing)
    }

    /// Create `path` and its parents. Returns `true` if anything was created.
    ///
    /// A non-directory occupying `path` is removed first.
    pub fn ensure_dir(path: &Path) -> io::Result<bool> {
        match Self::kind(path) {
            EntryKind::Dir => return Ok(false),
            EntryKind::File | EntryKind::Other => fs::remove_file(path)?,
            EntryKind::Missing => {}
        }
        fs::create_dir_all(path)?;
        Ok(true)
    }

    /// Copy a file over `to`, creating parent directories as needed.
    pub fn copy_file(from: &Path, to: &Path) -> io::Result<u64> {
        if let Some(parent) = to.parent() {
            Self::ensure_dir(parent)?;
        }
        if Self::kind(to).is_dir() {
            fs::remove_dir_all(to)?;
        }
        fs::copy(from, to)
    }

    /// Remove whatever is at `path`, recursively for directories.
    ///
    /// Returns the kind that was removed, `Missing` if nothing was there.
    pub fn remove(path: &Path) -> io::Result<EntryKind> {
        let kind = Self::kind(path);
        let result = match kind {
            EntryKind::Dir => fs::remove_dir_all(path),
            EntryKind::File | EntryKind::Other => fs::remove_file(path),
            EntryKind::Missing => return Ok(EntryKind::Missing),
        };

        match result {
            Ok(()) => Ok(kind),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(EntryKind::Missing),
            Err(e) => Err(e),
        }
    }

    /// Move `from` to `to`, replacing whatever is at `to`.
    pub fn rename(from: &Path, to: &Path) -> io::Result<()> {
        if let Some(parent) = to.parent() {
            Self::ensure_dir(parent)?;
        }
        if Self::kind(to).is_dir() {
            fs::remove_dir_all(to)?;
        }
        fs::rename(from, to)
    }
}
