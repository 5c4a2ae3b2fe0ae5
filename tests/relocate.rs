use assert_fs::prelude::*;
use std::fs;
use std::path::Path;

use savekeep::{AttemptState, Engine, SaveKeepError};

fn seed_backups(dir: &assert_fs::TempDir) {
    dir.child("old/GameA/slot1.sav").write_str("alpha").unwrap();
    dir.child("old/GameA/Scum_Bag_Screenshot.jpg").write_str("img").unwrap();
    dir.child("old/GameB/profiles/p1.sav").write_str("beta").unwrap();
    dir.child("old/GameC/empty").create_dir_all().unwrap();
}

fn state_of(report: &savekeep::RelocationReport, name: &str) -> AttemptState {
    report
        .attempts
        .iter()
        .find(|a| a.source.file_name().is_some_and(|n| n == name))
        .map(|a| a.state)
        .unwrap()
}

#[test]
fn moves_every_subdirectory() {
    let dir = assert_fs::TempDir::new().unwrap();
    seed_backups(&dir);
    let (old, new) = (dir.path().join("old"), dir.path().join("new"));
    let engine = Engine::default();

    let expected: Vec<_> = ["GameA", "GameB", "GameC"]
        .iter()
        .map(|n| engine.fingerprint(&old.join(n)).unwrap())
        .collect();

    let report = engine.relocate(&old, &new);
    assert!(report.success(), "{report:?}");
    assert_eq!(report.attempts.len(), 3);
    for (name, fp) in ["GameA", "GameB", "GameC"].iter().zip(expected) {
        assert!(!old.join(name).exists(), "{name} should be gone from the old root");
        assert_eq!(engine.fingerprint(&new.join(name)), Some(fp));
    }
    dir.child("new/GameA/Scum_Bag_Screenshot.jpg").assert("img");
    assert!(new.join("GameC/empty").is_dir());
}

#[test]
fn failed_verification_keeps_original_and_siblings_proceed() {
    let dir = assert_fs::TempDir::new().unwrap();
    seed_backups(&dir);
    // Left over from an earlier attempt: makes the GameB copy diverge.
    dir.child("new/GameB/stray.sav").write_str("junk").unwrap();
    let (old, new) = (dir.path().join("old"), dir.path().join("new"));
    let engine = Engine::default();

    let report = engine.relocate(&old, &new);
    assert!(!report.success());
    assert_eq!(state_of(&report, "GameA"), AttemptState::Deleted);
    assert_eq!(state_of(&report, "GameB"), AttemptState::VerifyFailed);
    assert_eq!(state_of(&report, "GameC"), AttemptState::Deleted);
    dir.child("old/GameB/profiles/p1.sav").assert("beta");
    assert!(!old.join("GameA").exists());

    let failed: Vec<_> = report.failures().collect();
    assert_eq!(failed.len(), 1);
    assert!(matches!(
        failed[0].failure,
        Some(SaveKeepError::VerificationFailed { .. })
    ));

    // Fix the cause and re-run with the same arguments.
    fs::remove_file(new.join("GameB/stray.sav")).unwrap();
    let rerun = engine.relocate(&old, &new);
    assert!(rerun.success(), "{rerun:?}");
    assert_eq!(rerun.attempts.len(), 1, "already moved folders are not enumerated again");
    assert!(!old.join("GameB").exists());
    dir.child("new/GameB/profiles/p1.sav").assert("beta");
}

#[test]
fn stale_partial_copy_is_overwritten() {
    let dir = assert_fs::TempDir::new().unwrap();
    seed_backups(&dir);
    dir.child("new/GameA/slot1.sav").write_str("alp").unwrap();
    let report = Engine::default().relocate(&dir.path().join("old"), &dir.path().join("new"));
    assert!(report.success(), "{report:?}");
    dir.child("new/GameA/slot1.sav").assert("alpha");
}

#[test]
fn top_level_files_are_left_in_place() {
    let dir = assert_fs::TempDir::new().unwrap();
    seed_backups(&dir);
    dir.child("old/notes.txt").write_str("keep me").unwrap();
    let (old, new) = (dir.path().join("old"), dir.path().join("new"));

    let report = Engine::default().relocate(&old, &new);
    assert!(report.success());
    assert_eq!(report.skipped_files, vec![old.join("notes.txt")]);
    dir.child("old/notes.txt").assert("keep me");
    assert!(!new.join("notes.txt").exists());
}

#[test]
fn creates_missing_new_root() {
    let dir = assert_fs::TempDir::new().unwrap();
    seed_backups(&dir);
    let new = dir.path().join("deep/er/new");
    let report = Engine::default().relocate(&dir.path().join("old"), &new);
    assert!(report.success());
    assert!(new.join("GameB/profiles/p1.sav").is_file());
}

#[test]
fn refusals_touch_nothing() {
    let dir = assert_fs::TempDir::new().unwrap();
    seed_backups(&dir);
    let old = dir.path().join("old");
    let nested = old.join("GameA/nested");
    let engine = Engine::default();

    for new in [Path::new(""), old.as_path(), nested.as_path()] {
        let report = engine.relocate(&old, new);
        assert!(!report.success());
        assert!(matches!(report.aborted, Some(SaveKeepError::RelocationRefused(_))));
    }
    dir.child("old/GameA/slot1.sav").assert("alpha");
    assert!(!old.join("GameA/nested").exists());
}

#[cfg(unix)]
#[test]
fn unreadable_file_blocks_deletion() {
    use std::os::unix::fs::PermissionsExt;
    if unsafe { libc::geteuid() } == 0 {
        return;
    }
    let dir = assert_fs::TempDir::new().unwrap();
    dir.child("old/GameA/slot1.sav").write_str("alpha").unwrap();
    dir.child("old/GameA/locked.sav").write_str("secret").unwrap();
    let locked = dir.path().join("old/GameA/locked.sav");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    let report = Engine::default().relocate(&dir.path().join("old"), &dir.path().join("new"));
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();

    assert!(!report.success());
    assert_eq!(state_of(&report, "GameA"), AttemptState::VerifyFailed);
    dir.child("old/GameA/slot1.sav").assert("alpha");
}
