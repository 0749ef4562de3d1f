// Tests for the live watcher driving the event applier

use crate::Fixture;
use foldsync::service::pump_events;
use foldsync::sync::FsWatcher;
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Poll until `check` passes or the deadline expires.
async fn eventually(check: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(10);
    while Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    check()
}

fn content_is(path: &Path, expected: &str) -> bool {
    fs::read_to_string(path).map(|c| c == expected).unwrap_or(false)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_watched_rename_without_full_pass() {
    let fx = Fixture::new();
    fx.write_source("old.txt", "renamed content");
    fx.sync.synchronize().unwrap();

    let watcher = FsWatcher::start(&fx.source()).unwrap();
    let cancel = CancellationToken::new();
    let pump = tokio::spawn(pump_events(watcher, fx.sync.clone(), cancel.clone()));

    fs::rename(fx.source().join("old.txt"), fx.source().join("new.txt")).unwrap();

    let new_path = fx.replica().join("new.txt");
    let old_path = fx.replica().join("old.txt");
    let done = eventually(|| content_is(&new_path, "renamed content") && !old_path.exists()).await;

    cancel.cancel();
    pump.await.unwrap().unwrap();
    assert!(done, "replica did not follow the rename");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_watched_create_and_modify() {
    let fx = Fixture::new();
    fx.sync.synchronize().unwrap();

    let watcher = FsWatcher::start(&fx.source()).unwrap();
    let cancel = CancellationToken::new();
    let pump = tokio::spawn(pump_events(watcher, fx.sync.clone(), cancel.clone()));

    fx.write_source("live/note.txt", "first");
    let note = fx.replica().join("live").join("note.txt");
    let created = eventually(|| content_is(&note, "first")).await;

    fx.write_source("live/note.txt", "second");
    let modified = eventually(|| content_is(&note, "second")).await;

    cancel.cancel();
    pump.await.unwrap().unwrap();
    assert!(created, "created file never reached the replica");
    assert!(modified, "modified file never reached the replica");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_watched_move_out_of_tree_deletes() {
    let fx = Fixture::new();
    fx.write_source("leaving.txt", "bye");
    fx.sync.synchronize().unwrap();

    let watcher = FsWatcher::start(&fx.source()).unwrap();
    let cancel = CancellationToken::new();
    let pump = tokio::spawn(pump_events(watcher, fx.sync.clone(), cancel.clone()));

    let outside = fx.source().parent().unwrap().join("outside.txt");
    fs::rename(fx.source().join("leaving.txt"), &outside).unwrap();

    let stale = fx.replica().join("leaving.txt");
    let removed = eventually(|| !stale.exists()).await;

    cancel.cancel();
    pump.await.unwrap().unwrap();
    assert!(removed, "replica kept a file moved out of the source");
}
