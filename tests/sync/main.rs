// Integration tests for the sync engine
// Full passes, event application and the live watcher

mod full_pass_tests;
mod watcher_tests;

use foldsync::logging::MemorySink;
use foldsync::sync::{Roots, Synchronizer};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// A temp workspace with `source/` created and `replica/` left for the engine.
pub struct Fixture {
    _dir: TempDir,
    pub sync: Synchronizer,
    pub sink: Arc<MemorySink>,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("source")).unwrap();
        let roots = Roots::resolve(&dir.path().join("source"), &dir.path().join("replica")).unwrap();
        let sink = Arc::new(MemorySink::new());
        let sync = Synchronizer::new(roots, sink.clone());
        Self {
            _dir: dir,
            sync,
            sink,
        }
    }

    pub fn source(&self) -> PathBuf {
        self.sync.roots().source().to_path_buf()
    }

    pub fn replica(&self) -> PathBuf {
        self.sync.roots().replica().to_path_buf()
    }

    pub fn write_source(&self, relative: &str, content: &str) {
        write(&self.source().join(relative), content);
    }

    pub fn write_replica(&self, relative: &str, content: &str) {
        write(&self.replica().join(relative), content);
    }

    pub fn read_replica(&self, relative: &str) -> String {
        fs::read_to_string(self.replica().join(relative)).unwrap()
    }
}

pub fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// Every entry under `root`: files map to their bytes, directories to `None`.
pub fn snapshot(root: &Path) -> BTreeMap<PathBuf, Option<Vec<u8>>> {
    fn walk(root: &Path, dir: &Path, out: &mut BTreeMap<PathBuf, Option<Vec<u8>>>) {
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            let relative = path.strip_prefix(root).unwrap().to_path_buf();
            if path.is_dir() {
                out.insert(relative, None);
                walk(root, &path, out);
            } else {
                out.insert(relative, Some(fs::read(&path).unwrap()));
            }
        }
    }

    let mut out = BTreeMap::new();
    if root.is_dir() {
        walk(root, root, &mut out);
    }
    out
}
