//! Source/replica root resolution.

use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::{Result, SyncError};

/// The pair of tree roots every sync operation works against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roots {
    source: PathBuf,
    replica: PathBuf,
}

impl Roots {
    /// Resolve both roots to absolute form, canonical where they exist.
    ///
    /// Fails when one root is the other or lies inside it.
    pub fn resolve(source: &Path, replica: &Path) -> Result<Self> {
        let source = resolve_path(source).map_err(|e| SyncError::io("resolving", source, e))?;
        let replica = resolve_path(replica).map_err(|e| SyncError::io("resolving", replica, e))?;

        if replica.starts_with(&source) || source.starts_with(&replica) {
            return Err(SyncError::OverlappingRoots {
                source_root: source,
                replica_root: replica,
            });
        }

        Ok(Self { source, replica })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn replica(&self) -> &Path {
        &self.replica
    }

    /// Path of a source entry relative to the source root.
    pub fn relative<'a>(&self, source_path: &'a Path) -> Result<&'a Path> {
        source_path
            .strip_prefix(&self.source)
            .map_err(|_| SyncError::OutsideSource {
                path: source_path.to_path_buf(),
            })
    }

    /// The replica counterpart of a source path: `replica + relative(path, source)`.
    pub fn replica_path(&self, source_path: &Path) -> Result<PathBuf> {
        let relative = self.relative(source_path)?;
        if relative.as_os_str().is_empty() {
            return Ok(self.replica.clone());
        }
        Ok(self.replica.join(relative))
    }
}

/// Make a path absolute and lexically normalized, then canonicalize if it exists.
pub fn resolve_path(path: &Path) -> io::Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    let normalized = normalize_path(&absolute);

    match dunce::canonicalize(&normalized) {
        Ok(canonical) => Ok(canonical),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(normalized),
        Err(e) => Err(e),
    }
}

/// Remove `.` and `..` components without touching the filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::ParentDir => {
                normalized.pop();
            }
            Component::CurDir => {}
            _ => normalized.push(component),
        }
    }

    if normalized.as_os_str().is_empty() {
        normalized.push(Component::RootDir);
    }

    normalized
}
