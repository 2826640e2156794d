//! Console and log file output
//!
//! Everything goes to stderr and, unless disabled, to a log file that is
//! truncated at start-up. The file defaults to `atom-updater.log` next to the
//! executable, with the platform local data directory as fall-back when that
//! location is not writable. Stdout stays free for the run summary.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Log file name used next to the executable
pub const LOG_FILE_NAME: &str = "atom-updater.log";

/// Environment variable holding a `tracing` filter directive
pub const LOG_FILTER_ENV: &str = "ATOM_UPDATER_LOG";

/// Where the log file goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFile {
    /// Next to the executable, falling back to the local data directory
    Default,
    /// Exactly this path
    Path(PathBuf),
    /// Console only
    Disabled,
}

/// Keeps the file writer flushing until dropped at the end of `main`
pub struct LoggingGuard {
    _worker: Option<WorkerGuard>,
    file: Option<PathBuf>,
}

impl LoggingGuard {
    /// Log file in use, if any
    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }
}

/// Install the global subscriber
///
/// Never fails: a log file that cannot be opened downgrades to console-only
/// output with a warning.
pub fn init(log_file: &LogFile, verbose: bool) -> LoggingGuard {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time();

    let mut problems = Vec::new();
    let opened = open_first(&candidates(log_file), &mut problems);

    let (file_layer, worker, file) = match opened {
        Some((handle, path)) => {
            let (writer, guard) = tracing_appender::non_blocking(handle);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false);
            (Some(layer), Some(guard), Some(path))
        }
        None => (None, None, None),
    };

    // A subscriber installed earlier (tests) wins
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .try_init();

    for problem in &problems {
        warn!("{problem}");
    }
    match &file {
        Some(path) => info!("=== atom-updater started, log file: {} ===", path.display()),
        None if *log_file != LogFile::Disabled => {
            warn!("Continuing with console-only logging");
        }
        None => {}
    }

    LoggingGuard {
        _worker: worker,
        file,
    }
}

/// Log file locations to try, in order
pub fn candidates(log_file: &LogFile) -> Vec<PathBuf> {
    match log_file {
        LogFile::Disabled => Vec::new(),
        LogFile::Path(path) => vec![path.clone()],
        LogFile::Default => {
            let mut paths = Vec::new();
            if let Some(dir) = std::env::current_exe()
                .ok()
                .and_then(|exe| exe.parent().map(Path::to_path_buf))
            {
                paths.push(dir.join(LOG_FILE_NAME));
            }
            if let Some(dir) = dirs::data_local_dir() {
                paths.push(dir.join("atom-updater").join(LOG_FILE_NAME));
            }
            paths
        }
    }
}

/// Create (truncating) the first openable file among `paths`
///
/// Failures are collected into `problems` for reporting once logging works.
pub fn open_first(paths: &[PathBuf], problems: &mut Vec<String>) -> Option<(File, PathBuf)> {
    for path in paths {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Err(e) = fs::create_dir_all(parent) {
                problems.push(format!(
                    "Could not create log directory {}: {e}",
                    parent.display()
                ));
                continue;
            }
        }

        match File::create(path) {
            Ok(file) => return Some((file, path.clone())),
            Err(e) => problems.push(format!("Could not open log file {}: {e}", path.display())),
        }
    }

    None
}
