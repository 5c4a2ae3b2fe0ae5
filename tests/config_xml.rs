use serial_test::serial;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

use savekeep::config::{CONFIG_ENV, config_path, default_config_path, load_config};
use savekeep::{Config, LogLevel, UnreadablePolicy};

#[test]
#[serial]
fn env_var_selects_config_file() {
    let td = tempdir().unwrap();
    let base = fs::canonicalize(td.path()).unwrap();
    let cfg = base.join("custom.xml");
    fs::write(
        &cfg,
        format!(
            "<config>\n  <backups_directory>{}</backups_directory>\n  <log_level>quiet</log_level>\n  <unreadable_files>fail</unreadable_files>\n</config>",
            base.join("backups").display()
        ),
    )
    .unwrap();

    unsafe {
        std::env::set_var(CONFIG_ENV, &cfg);
    }
    let resolved = config_path(None);
    let loaded = load_config(None);
    unsafe {
        std::env::remove_var(CONFIG_ENV);
    }

    assert_eq!(resolved, Some(cfg));
    let loaded = loaded.unwrap();
    assert_eq!(loaded.backups_directory, Some(base.join("backups")));
    assert_eq!(loaded.log_level, LogLevel::Quiet);
    assert_eq!(loaded.unreadable_files, UnreadablePolicy::Fail);
}

#[test]
#[serial]
fn explicit_path_beats_env_var() {
    let td = tempdir().unwrap();
    let explicit = td.path().join("explicit.xml");
    unsafe {
        std::env::set_var(CONFIG_ENV, td.path().join("from-env.xml"));
    }
    let resolved = config_path(Some(&explicit));
    unsafe {
        std::env::remove_var(CONFIG_ENV);
    }
    assert_eq!(resolved, Some(explicit));
}

#[test]
#[serial]
fn empty_env_var_falls_back_to_default() {
    unsafe {
        std::env::set_var(CONFIG_ENV, "");
    }
    let resolved = config_path(None);
    unsafe {
        std::env::remove_var(CONFIG_ENV);
    }
    assert_eq!(resolved, default_config_path());
}

#[test]
#[serial]
fn env_pointing_at_missing_file_yields_defaults() {
    let td = tempdir().unwrap();
    unsafe {
        std::env::set_var(CONFIG_ENV, td.path().join("absent.xml"));
    }
    let loaded = load_config(None);
    unsafe {
        std::env::remove_var(CONFIG_ENV);
    }
    assert_eq!(loaded.unwrap(), Config::default());
}

#[test]
#[serial]
fn malformed_file_is_an_error() {
    let td = tempdir().unwrap();
    let cfg = td.path().join("broken.xml");
    fs::write(&cfg, "<config><log_level>debug</config>").unwrap();
    let err = load_config(Some(&cfg)).unwrap_err();
    assert!(format!("{err:#}").contains("broken.xml"), "{err:#}");
}

#[test]
fn defaults_match_engine_defaults() {
    let cfg = Config::default();
    let opts = cfg.engine_options();
    assert_eq!(opts.screenshot_name, savekeep::DEFAULT_SCREENSHOT_NAME);
    assert_eq!(opts.unreadable, UnreadablePolicy::Skip);
    assert_eq!(cfg.backups_directory, None::<PathBuf>);
}
