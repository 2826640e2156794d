//! CLI definitions using clap derive API

use std::path::PathBuf;
use std::time::Duration;

use clap::builder::{Styles, styling::AnsiColor};
use clap::{ArgAction, Parser};

use crate::logging::LogFile;

/// atom-updater - atomic application directory updater
///
/// Waits for a running application to exit, swaps its directory for a staged
/// new version with full rollback on failure, then starts the new version.
#[derive(Parser, Debug)]
#[command(
    name = "atom-updater",
    author,
    version,
    disable_version_flag = true,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Atomically replace an application directory and relaunch it",
    long_about = "atom-updater waits for the process PID to exit, moves the contents of \
                  CURRENT_DIR into a temporary backup, copies NEW_DIR into place and starts \
                  the updated application. Any failure before the copy completes restores \
                  the original contents. macOS .app bundles inside the directory are \
                  replaced as single units.",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n    \
                  atom-updater 12345 /opt/myapp /tmp/myapp-2.0\n    \
                  atom-updater 12345 /Applications/MyApp /tmp/staged --app-name MyApp\n    \
                  atom-updater 12345 C:\\Apps\\Tool C:\\Temp\\Tool --app-name tool.exe\n\n\
                  \x1b[1m\x1b[32mExit status:\x1b[0m\n    \
                  0  update applied (launch problems are only warnings)\n    \
                  1  update failed, application directory unchanged\n    \
                  2  rollback failed, restore from the reported backup directory"
)]
pub struct Cli {
    /// PID of the application process to wait for
    #[arg(value_parser = clap::value_parser!(u32).range(1..))]
    pub pid: u32,

    /// Directory of the installed application
    pub current_dir: PathBuf,

    /// Directory holding the new version
    pub new_dir: PathBuf,

    /// Name of the executable to launch after the update
    #[arg(long, value_name = "NAME")]
    pub app_name: Option<String>,

    /// Do not launch the application after the update
    #[arg(long)]
    pub no_launch: bool,

    /// Expected BLAKE3 checksum of NEW_DIR, verified before anything changes
    #[arg(long, value_name = "HASH")]
    pub checksum: Option<String>,

    /// Give up waiting for PID after this many seconds (default: wait forever)
    #[arg(long, value_name = "SECS")]
    pub wait_timeout: Option<u64>,

    /// Log file path (defaults to atom-updater.log next to the executable)
    #[arg(long, value_name = "PATH", env = "ATOM_UPDATER_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Log to the console only (overrides --log-file)
    #[arg(long)]
    pub no_log_file: bool,

    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Print version
    #[allow(dead_code)]
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    version: Option<bool>,
}

impl Cli {
    /// Log file selection from `--log-file` / `--no-log-file`
    pub fn log_target(&self) -> LogFile {
        match (&self.log_file, self.no_log_file) {
            (_, true) => LogFile::Disabled,
            (Some(path), false) => LogFile::Path(path.clone()),
            (None, false) => LogFile::Default,
        }
    }

    pub fn wait_timeout(&self) -> Option<Duration> {
        self.wait_timeout.map(Duration::from_secs)
    }
}
