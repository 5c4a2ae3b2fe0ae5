use assert_fs::prelude::*;
use std::fs;

use savekeep::{CopyOptions, Engine};

#[test]
fn copies_nested_tree_into_new_destination() {
    let dir = assert_fs::TempDir::new().unwrap();
    dir.child("src/slot1.sav").write_str("one").unwrap();
    dir.child("src/profiles/p1/data.bin").write_binary(&[0, 1, 2, 3]).unwrap();
    dir.child("src/Scum_Bag_Screenshot.jpg").write_str("img").unwrap();
    let (src, dst) = (dir.path().join("src"), dir.path().join("backups/game"));

    let engine = Engine::default();
    let report = engine.copy_dir(&src, &dst, CopyOptions::default());
    assert!(report.is_complete(), "{report:?}");
    assert_eq!(report.copied.len(), 3, "the screenshot is copied, only hashing skips it");
    assert_eq!(fs::read(dst.join("profiles/p1/data.bin")).unwrap(), vec![0u8, 1, 2, 3]);
    assert!(!engine.has_changed(&src, &dst));
    assert_eq!(engine.fingerprint(&src), engine.fingerprint(&dst));
}

#[test]
fn failures_do_not_truncate_the_rest_of_the_tree() {
    let dir = assert_fs::TempDir::new().unwrap();
    for name in ["a.sav", "m/b.sav", "z/c.sav"] {
        dir.child(format!("src/{name}")).write_str("new").unwrap();
    }
    // An existing destination file blocks that entry only.
    dir.child("dst/a.sav").write_str("old").unwrap();
    let (src, dst) = (dir.path().join("src"), dir.path().join("dst"));

    let report = Engine::default().copy_dir(&src, &dst, CopyOptions::default());
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.copied.len(), 2);
    assert_eq!(fs::read_to_string(dst.join("z/c.sav")).unwrap(), "new");
    assert_eq!(fs::read_to_string(dst.join("a.sav")).unwrap(), "old");
}

#[test]
fn rerun_with_overwrite_converges() {
    let dir = assert_fs::TempDir::new().unwrap();
    dir.child("src/a.sav").write_str("v2").unwrap();
    dir.child("dst/a.sav").write_str("v1-partial").unwrap();
    let (src, dst) = (dir.path().join("src"), dir.path().join("dst"));
    let engine = Engine::default();
    let opts = CopyOptions {
        overwrite: true,
        ..CopyOptions::default()
    };
    assert!(engine.copy_dir(&src, &dst, opts).is_complete());
    assert!(engine.copy_dir(&src, &dst, opts).is_complete());
    assert!(!engine.has_changed(&src, &dst));
}

#[test]
fn missing_source_is_reported_not_raised() {
    let dir = assert_fs::TempDir::new().unwrap();
    let report = Engine::default().copy_dir(
        &dir.path().join("missing"),
        &dir.path().join("dst"),
        CopyOptions::default(),
    );
    assert!(report.source_missing);
    assert!(!report.is_complete());
}
