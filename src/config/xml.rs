//! XML configuration support.
//! - Loads settings from config.xml (quick_xml + serde).
//! - Writes a commented template on request.
//!
//! Notes:
//! - A missing file means "use defaults"; a present but malformed file is an error.
//! - Unknown elements are rejected so typos do not silently fall back to defaults.

use anyhow::{Context, Result, anyhow, bail};
use quick_xml::de::from_str as from_xml_str;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use super::paths::{config_path, default_log_path, path_has_symlink_ancestor};
use super::types::{Config, LogLevel};

use crate::engine::{DEFAULT_SCREENSHOT_NAME, UnreadablePolicy};
use crate::platform::write_config_secure_new;

/// Struct mirroring the XML config for deserialization.
#[derive(Debug, Deserialize)]
#[serde(rename = "config")]
#[serde(deny_unknown_fields)]
struct XmlConfig {
    backups_directory: Option<String>,
    screenshot_name: Option<String>,
    log_level: Option<String>,
    log_file: Option<String>,
    #[serde(default, deserialize_with = "de_u32_trimmed_opt")]
    read_attempts: Option<u32>,
    #[serde(default, deserialize_with = "de_u32_trimmed_opt")]
    hash_attempts: Option<u32>,
    unreadable_files: Option<String>,
}

// Trims surrounding whitespace; an empty element counts as unset.
fn de_u32_trimmed_opt<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s
            .parse::<u32>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("expected a whole number, got '{s}'"))),
    }
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

// Map XmlConfig -> Config, validating values as we go.
fn xml_to_config(parsed: XmlConfig) -> Result<Config> {
    let mut cfg = Config::default();

    cfg.backups_directory = non_empty(parsed.backups_directory).map(PathBuf::from);
    cfg.log_file = non_empty(parsed.log_file).map(PathBuf::from);
    if let Some(name) = non_empty(parsed.screenshot_name) {
        cfg.screenshot_name = name;
    }
    if let Some(level) = non_empty(parsed.log_level) {
        cfg.log_level = level.parse::<LogLevel>().map_err(|e| anyhow!(e))?;
    }
    if let Some(policy) = non_empty(parsed.unreadable_files) {
        cfg.unreadable_files = policy.parse::<UnreadablePolicy>().map_err(|e| anyhow!(e))?;
    }
    for (name, value, slot) in [
        ("read_attempts", parsed.read_attempts, &mut cfg.read_attempts),
        ("hash_attempts", parsed.hash_attempts, &mut cfg.hash_attempts),
    ] {
        match value {
            Some(0) => bail!("{name} must be at least 1"),
            Some(n) => *slot = n,
            None => {}
        }
    }
    Ok(cfg)
}

/// Load a Config from a specific XML file path.
pub fn load_config_from_xml_path(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("read config xml '{}'", path.display()))?;
    let parsed: XmlConfig = from_xml_str(&contents)
        .with_context(|| format!("parse config xml '{}'", path.display()))?;
    xml_to_config(parsed).with_context(|| format!("invalid value in '{}'", path.display()))
}

/// Load the config in effect (see `config_path`). Defaults when no file exists.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    match config_path(explicit) {
        Some(path) if path.exists() => load_config_from_xml_path(&path),
        Some(path) if explicit.is_some() => {
            bail!("config file '{}' does not exist", path.display())
        }
        _ => Ok(Config::default()),
    }
}

/// Create a commented template config (0600 on Unix). Refuses to overwrite
/// an existing file or to write beneath a symlinked ancestor.
pub fn create_template_config(path: &Path) -> Result<()> {
    if path_has_symlink_ancestor(path)? {
        bail!(
            "Refusing to create config: ancestor of {} is a symlink",
            path.display()
        );
    }

    let suggested_log = default_log_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "/path/to/savekeep.log".into());

    let content = format!(
        "<!--\n  savekeep configuration (XML)\n\n    backups_directory -> current backup root (default source for `relocate`)\n    screenshot_name   -> file left out of fingerprints and counts\n    log_level         -> quiet | normal | info | debug\n    log_file          -> optional log file (logs always go to stderr too), e.g. {suggested_log}\n    read_attempts     -> attempts for whole-file reads (locked files back off 200..1600ms)\n    hash_attempts     -> attempts per file while hashing (50/100/200ms backoff)\n    unreadable_files  -> skip | fail : what a directory fingerprint does with unreadable files\n\n  CLI flags override XML values.\n-->\n<config>\n  <backups_directory></backups_directory>\n  <screenshot_name>{DEFAULT_SCREENSHOT_NAME}</screenshot_name>\n  <log_level>normal</log_level>\n  <log_file></log_file>\n  <read_attempts>5</read_attempts>\n  <hash_attempts>4</hash_attempts>\n  <unreadable_files>skip</unreadable_files>\n</config>\n"
    );

    write_config_secure_new(path, content.as_bytes())
        .with_context(|| format!("write template config '{}'", path.display()))?;
    info!(path = %path.display(), "Created template config");
    Ok(())
}
