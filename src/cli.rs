//! CLI definition and parsing.
//! Defines Args/Command and provides parse() for command-line handling.
//!
//! Notes:
//! - --debug is a shorthand for --log-level debug.
//! - Path arguments have stray surrounding quotes stripped (PowerShell/CMD quoting).

use clap::{Parser, Subcommand, ValueHint};
use std::path::PathBuf;

use crate::config::types::{Config, LogLevel};
use crate::engine::UnreadablePolicy;

/// Change detection and safe relocation for game save backups.
/// CLI flags override config values (which are loaded from XML if present).
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, arg_required_else_help = true)]
pub struct Args {
    /// Config file to use instead of $SAVEKEEP_CONFIG or the platform default.
    #[arg(long, global = true, value_name = "FILE", value_hint = ValueHint::FilePath, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// File name excluded from fingerprints and file counts.
    #[arg(long, global = true, value_name = "NAME")]
    pub screenshot_name: Option<String>,

    /// What a directory fingerprint does with unreadable files.
    #[arg(long, global = true, value_name = "skip|fail")]
    pub unreadable_files: Option<UnreadablePolicy>,

    /// Enable debug logging (equivalent to `--log-level debug`).
    #[arg(short = 'd', long, global = true)]
    pub debug: bool,

    /// Set log level. One of: quiet, normal, info, debug.
    #[arg(long, global = true)]
    pub log_level: Option<LogLevel>,

    /// Also write logs to this file.
    #[arg(long, global = true, value_name = "FILE", value_hint = ValueHint::FilePath, value_parser = parse_path)]
    pub log_file: Option<PathBuf>,

    /// Emit logs in structured JSON.
    #[arg(long, global = true)]
    pub json: bool,

    /// Print the config file location in effect and exit.
    #[arg(long)]
    pub print_config: bool,

    /// Write a template config file at the location in effect and exit.
    #[arg(long)]
    pub init_config: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print the fingerprint of a file or directory (empty line when unavailable).
    Fingerprint {
        #[arg(value_hint = ValueHint::AnyPath, value_parser = parse_path)]
        path: PathBuf,
    },
    /// Print `changed` or `unchanged` for a save location and its backup.
    Changed {
        #[arg(value_hint = ValueHint::AnyPath, value_parser = parse_path)]
        source: PathBuf,
        #[arg(value_hint = ValueHint::AnyPath, value_parser = parse_path)]
        target: PathBuf,
    },
    /// Read a file, retrying while another process holds it.
    Read {
        #[arg(value_hint = ValueHint::FilePath, value_parser = parse_path)]
        path: PathBuf,
        /// Write the bytes read here instead of printing their count.
        #[arg(short, long, value_hint = ValueHint::FilePath, value_parser = parse_path)]
        output: Option<PathBuf>,
    },
    /// Copy a directory tree.
    Copy {
        #[arg(value_hint = ValueHint::DirPath, value_parser = parse_path)]
        source: PathBuf,
        #[arg(value_hint = ValueHint::DirPath, value_parser = parse_path)]
        destination: PathBuf,
        /// Copy only the top-level files.
        #[arg(long)]
        no_recursive: bool,
        /// Replace files that already exist at the destination.
        #[arg(long)]
        overwrite: bool,
    },
    /// Move every backup subdirectory to a new root (copy, verify, delete).
    Relocate {
        /// Old backup root; defaults to `backups_directory` from the config.
        #[arg(long, value_hint = ValueHint::DirPath, value_parser = parse_path)]
        from: Option<PathBuf>,
        #[arg(value_hint = ValueHint::DirPath, value_parser = parse_path)]
        new_root: PathBuf,
    },
}

fn parse_path(s: &str) -> Result<PathBuf, String> {
    Ok(sanitize_str(s))
}

/// Trim surrounding single/double quotes left by PowerShell or CMD, and one
/// trailing separator (never the root itself).
fn sanitize_str(s: &str) -> PathBuf {
    let trimmed = s.trim();
    let mut inner = trimmed.trim_matches(|c| c == '\'' || c == '"').to_string();
    if (inner.ends_with('\\') || inner.ends_with('/')) && inner.len() > 1 && !inner.ends_with(":\\") {
        inner.pop();
    }
    PathBuf::from(inner)
}

impl Args {
    /// Effective log level derived from flags.
    /// Precedence: --debug > --log-level value > None (use config default).
    pub fn effective_log_level(&self) -> Option<LogLevel> {
        if self.debug {
            return Some(LogLevel::Debug);
        }
        self.log_level
    }

    /// Apply CLI overrides to a loaded Config (in-place). No-ops for unset flags.
    pub fn apply_overrides(&self, cfg: &mut Config) {
        if let Some(name) = &self.screenshot_name {
            cfg.screenshot_name = name.clone();
        }
        if let Some(policy) = self.unreadable_files {
            cfg.unreadable_files = policy;
        }
        if let Some(level) = self.effective_log_level() {
            cfg.log_level = level;
        }
        if let Some(file) = &self.log_file {
            cfg.log_file = Some(file.clone());
        }
    }
}

pub fn parse() -> Args {
    Args::parse()
}
