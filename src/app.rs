//! Application orchestrator.
//! Loads/merges config, initializes logging, installs the Ctrl-C handler,
//! builds the engine and runs one command.
//!
//! Exit codes: 0 success, 1 operation failed, 2 usage, otherwise
//! `SaveKeepError::code()` (130 when interrupted).

use anyhow::{Context, Result, anyhow};
use std::fs;
use std::path::Path;
use std::process::ExitCode;
use tracing::{debug, error, info, warn};

use savekeep::cli::{Args, Command};
use savekeep::config::{config_path, create_template_config, load_config};
use savekeep::output as out;
use savekeep::{
    CancelToken, Config, CopyOptions, CopyReport, Engine, RelocationReport, SaveKeepError,
    fs_ops::io_error_with_help,
};

use crate::logging::init_tracing;

fn exit_for(err: &SaveKeepError) -> ExitCode {
    ExitCode::from(u8::try_from(err.code()).unwrap_or(1))
}

/// Run the CLI application.
pub fn run(args: Args) -> Result<ExitCode> {
    // Config location commands run before logging init.
    if args.print_config {
        print_config_location(args.config.as_deref());
        return Ok(ExitCode::SUCCESS);
    }
    if args.init_config {
        let path = config_path(args.config.as_deref())
            .ok_or_else(|| anyhow!("could not determine a config path; set SAVEKEEP_CONFIG"))?;
        create_template_config(&path)?;
        out::print_success(&format!("Template config written to {}", path.display()));
        return Ok(ExitCode::SUCCESS);
    }
    let Some(command) = args.command.clone() else {
        out::print_error("no command given; see --help");
        return Ok(ExitCode::from(2));
    };

    // CLI args override config values.
    let mut cfg = load_config(args.config.as_deref())?;
    args.apply_overrides(&mut cfg);

    let guard = init_tracing(cfg.log_level, cfg.log_file.as_deref(), args.json).map_err(|e| {
        out::print_error(&format!("Failed to initialize logging: {e}"));
        e
    })?;

    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        if let Err(e) = ctrlc::set_handler(move || {
            cancel.cancel();
            out::print_warn("Received interrupt; stopping after the current step...");
        }) {
            warn!(error = %e, "Could not install Ctrl-C handler");
        }
    }

    debug!(?command, "Starting savekeep");
    let engine = Engine::new(cfg.engine_options()).with_cancel_token(cancel);
    let result = dispatch(&engine, &cfg, command);

    // Flush the file appender before exit.
    drop(guard);
    result
}

fn print_config_location(explicit: Option<&Path>) {
    if let Some(p) = explicit {
        out::print_info(&format!("Using config from --config:\n  {}", p.display()));
    } else if let Some(p) = std::env::var_os(savekeep::config::CONFIG_ENV) {
        out::print_info(&format!(
            "Using SAVEKEEP_CONFIG (explicit):\n  {}",
            Path::new(&p).display()
        ));
    }
    match config_path(explicit) {
        Some(p) if p.exists() => out::print_user(&p.display().to_string()),
        Some(p) => {
            out::print_user(&p.display().to_string());
            out::print_info("No config file exists there yet; defaults apply. Run with --init-config to create one.");
        }
        None => out::print_error("Could not determine a config path."),
    }
}

fn dispatch(engine: &Engine, cfg: &Config, command: Command) -> Result<ExitCode> {
    match command {
        Command::Fingerprint { path } => {
            let fp = engine.fingerprint(&path);
            out::print_user(fp.as_ref().map(|f| f.as_str()).unwrap_or(""));
            Ok(if fp.is_some() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }
        Command::Changed { source, target } => {
            let changed = engine.has_changed(&source, &target);
            out::print_user(if changed { "changed" } else { "unchanged" });
            Ok(ExitCode::SUCCESS)
        }
        Command::Read { path, output } => {
            let Some(bytes) = engine.read_all(&path) else {
                out::print_error(&format!("Could not read {}", path.display()));
                return Ok(ExitCode::FAILURE);
            };
            match output {
                Some(dest) => {
                    fs::write(&dest, &bytes).map_err(io_error_with_help("write", &dest))?;
                    out::print_success(&format!("Wrote {} bytes to {}", bytes.len(), dest.display()));
                }
                None => out::print_user(&bytes.len().to_string()),
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Copy {
            source,
            destination,
            no_recursive,
            overwrite,
        } => {
            let opts = CopyOptions {
                recursive: !no_recursive,
                overwrite,
            };
            let report = engine.copy_dir(&source, &destination, opts);
            Ok(report_copy(&source, &report))
        }
        Command::Relocate { from, new_root } => {
            let old_root = from
                .or_else(|| cfg.backups_directory.clone())
                .context("no old backup root: pass --from or set backups_directory in the config")?;
            let report = engine.relocate(&old_root, &new_root);
            Ok(report_relocation(&report))
        }
    }
}

fn report_copy(source: &Path, report: &CopyReport) -> ExitCode {
    if report.source_missing {
        let err = SaveKeepError::SourceNotFound(source.to_path_buf());
        error!(code = err.code(), kind = err.kind(), path = %source.display(), "Copy failed");
        out::print_error(&err.to_string());
        return exit_for(&err);
    }
    for failure in &report.failed {
        out::print_warn(&format!("{}: {}", failure.path.display(), failure.error));
    }
    let summary = format!(
        "Copied {} files ({} bytes), {} failed",
        report.copied.len(),
        report.bytes,
        report.failed.len()
    );
    if report.interrupted {
        out::print_warn(&format!("{summary}; interrupted"));
        return exit_for(&SaveKeepError::Interrupted);
    }
    if report.is_complete() {
        out::print_success(&summary);
        ExitCode::SUCCESS
    } else {
        out::print_error(&summary);
        ExitCode::FAILURE
    }
}

fn report_relocation(report: &RelocationReport) -> ExitCode {
    if let Some(err) = &report.aborted {
        out::print_error(&err.to_string());
        return exit_for(err);
    }
    for attempt in &report.attempts {
        match &attempt.failure {
            None => out::print_user(&format!(
                "moved {} -> {}",
                attempt.source.display(),
                attempt.destination.display()
            )),
            Some(err) => out::print_warn(&format!("kept {}: {err}", attempt.source.display())),
        }
    }
    for reason in &report.listing_errors {
        out::print_warn(&format!("could not list: {reason}"));
    }
    for file in &report.skipped_files {
        out::print_info(&format!("left in place (not a directory): {}", file.display()));
    }
    if report.interrupted {
        out::print_warn("Relocation interrupted; re-run to finish.");
        return exit_for(&SaveKeepError::Interrupted);
    }
    if report.success() {
        info!(moved = report.attempts.len(), "Relocation complete");
        out::print_success(&format!("Relocated {} backup folders", report.attempts.len()));
        ExitCode::SUCCESS
    } else {
        let failed = report.failures().count() + report.listing_errors.len();
        out::print_error(&format!(
            "{failed} of {} backup folders were not relocated. Fix the cause and re-run.",
            report.attempts.len() + report.listing_errors.len()
        ));
        ExitCode::FAILURE
    }
}
