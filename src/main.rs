//! atom-updater - atomic application directory updater
//!
//! Replaces an application directory with a staged new version while the
//! application is shutting down, with rollback on failure, then starts the
//! new version.

use clap::Parser;
use miette::Diagnostic;
use tracing::error;

mod cli;
mod commands;
mod detection;
mod domain;
mod error;
mod fs;
mod hash;
mod launcher;
mod locator;
mod logging;
mod process;
mod transaction;
mod ui;

use cli::Cli;
use error::{Severity, UpdaterError};

/// Log a fatal error with its help text
fn report_error(err: &UpdaterError) {
    match err.severity() {
        Severity::Critical => error!("CRITICAL: {err}"),
        Severity::Recoverable => error!("Update failed: {err}"),
    }
    if let Some(help) = err.help() {
        error!("  help: {help}");
    }
}

fn main() {
    let cli = Cli::parse();
    let guard = logging::init(&cli.log_target(), cli.verbose);

    if let Err(e) = commands::update::run(&cli) {
        report_error(&e);
        if let Some(path) = guard.file() {
            error!("Details in {}", path.display());
        }
        // exit skips destructors, flush the log file first
        drop(guard);
        std::process::exit(e.exit_code());
    }
}
