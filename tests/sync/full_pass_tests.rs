// Tests for full mirror + cleanup passes

use crate::{snapshot, Fixture};
use std::fs;
use std::path::PathBuf;

#[test]
fn test_initial_sync_into_empty_replica() {
    let fx = Fixture::new();
    fx.write_source("a.txt", "x");
    fx.write_source("sub/b.txt", "y");

    fx.sync.synchronize().unwrap();

    assert_eq!(fx.read_replica("a.txt"), "x");
    assert_eq!(fx.read_replica("sub/b.txt"), "y");
    let entries: Vec<PathBuf> = snapshot(&fx.replica()).into_keys().collect();
    assert_eq!(
        entries,
        vec![
            PathBuf::from("a.txt"),
            PathBuf::from("sub"),
            PathBuf::from("sub").join("b.txt"),
        ]
    );
}

#[test]
fn test_update_detection_same_length() {
    let fx = Fixture::new();
    fx.write_source("a.txt", "x");
    fx.sync.synchronize().unwrap();
    assert_eq!(fx.read_replica("a.txt"), "x");

    fx.write_source("a.txt", "z");
    let stats = fx.sync.synchronize().unwrap();

    assert_eq!(fx.read_replica("a.txt"), "z");
    assert_eq!(stats.files_copied, 1);
}

#[test]
fn test_stale_file_is_deleted() {
    let fx = Fixture::new();
    fx.write_source("keep.txt", "k");
    fx.write_replica("stale.txt", "old");

    let stats = fx.sync.synchronize().unwrap();

    assert!(!fx.replica().join("stale.txt").exists());
    assert!(fx.replica().join("keep.txt").is_file());
    assert_eq!(stats.files_deleted, 1);
    assert_eq!(fx.sink.count_prefix("Deleted file:"), 1);
}

#[test]
fn test_stale_directory_is_deleted_whole() {
    let fx = Fixture::new();
    fx.write_replica("old_dir/deep/x.txt", "x");
    fx.write_replica("old_dir/y.txt", "y");

    let stats = fx.sync.synchronize().unwrap();

    assert!(!fx.replica().join("old_dir").exists());
    assert_eq!(stats.dirs_deleted, 1);
    assert_eq!(stats.files_deleted, 0);
}

#[test]
fn test_cleanup_recurses_into_shared_directories() {
    let fx = Fixture::new();
    fx.write_source("shared/live.txt", "l");
    fx.write_replica("shared/live.txt", "l");
    fx.write_replica("shared/dead.txt", "d");

    fx.sync.synchronize().unwrap();

    assert!(fx.replica().join("shared").join("live.txt").is_file());
    assert!(!fx.replica().join("shared").join("dead.txt").exists());
}

#[test]
fn test_second_pass_is_a_no_op() {
    let fx = Fixture::new();
    fx.write_source("a.txt", "x");
    fx.write_source("sub/b.txt", "y");
    fx.write_source("sub/deeper/c.txt", "z");
    fx.write_replica("junk.txt", "j");

    let first = fx.sync.synchronize().unwrap();
    assert!(first.changes() > 0);
    fx.sink.clear();

    let second = fx.sync.synchronize().unwrap();

    assert_eq!(second.changes(), 0);
    assert_eq!(second.errors, 0);
    assert_eq!(fx.sink.count_prefix("Copied:"), 0);
    assert_eq!(fx.sink.count_prefix("Deleted"), 0);
    assert_eq!(fx.sink.records().len(), 1);
}

#[test]
fn test_converges_after_many_mutations() {
    let fx = Fixture::new();
    fx.write_source("a.txt", "1");
    fx.write_source("dir/b.txt", "2");
    fx.write_source("dir/sub/c.txt", "3");
    fx.sync.synchronize().unwrap();

    fs::remove_file(fx.source().join("a.txt")).unwrap();
    fs::rename(fx.source().join("dir"), fx.source().join("moved")).unwrap();
    fx.write_source("moved/sub/c.txt", "three");
    fx.write_source("new/empty_soon/d.txt", "4");
    fs::create_dir_all(fx.source().join("empty")).unwrap();
    fx.write_replica("replica_only/e.txt", "5");

    fx.sync.synchronize().unwrap();

    assert_eq!(snapshot(&fx.source()), snapshot(&fx.replica()));
}

#[test]
fn test_cleanup_never_removes_names_still_in_source() {
    let fx = Fixture::new();
    fx.write_source("a.txt", "x");
    fx.write_source("d/b.txt", "y");
    fx.write_replica("a.txt", "different");
    fx.write_replica("d/b.txt", "different too");

    fx.sync.synchronize().unwrap();

    assert_eq!(fx.sink.count_prefix("Deleted"), 0);
    assert_eq!(fx.read_replica("a.txt"), "x");
    assert_eq!(fx.read_replica("d/b.txt"), "y");
}

#[test]
fn test_source_vanishing_is_reported_distinctly() {
    let fx = Fixture::new();
    fx.write_source("a.txt", "x");
    fx.sync.synchronize().unwrap();

    fs::remove_dir_all(fx.source()).unwrap();
    let err = fx.sync.synchronize().unwrap_err();

    assert!(err.is_source_missing());
    // Replica is left as it was.
    assert_eq!(fx.read_replica("a.txt"), "x");
}
