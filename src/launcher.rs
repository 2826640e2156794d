//! Start the freshly installed application
//!
//! The launched process is fully detached from the updater: null stdio, its
//! own process group, and nobody waits on it. A launch failure never undoes
//! the replacement.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::detection::classify;
use crate::domain::{ApplicationType, Platform};
use crate::error::fs::read_failed;
use crate::error::replace::launch_failed;
use crate::error::{Result, UpdaterError};
use crate::locator;
use crate::ui::Reporter;

/// Program used to open bundles on macOS
const BUNDLE_OPENER: &str = "open";

/// A started application
#[derive(Debug, Clone)]
pub struct Launched {
    pub pid: u32,
    /// File or bundle that was started
    pub target: PathBuf,
}

/// Launch whatever `path` holds, dispatching on its classified type
///
/// - single file: executed directly
/// - bundle: opened through the platform bundle opener
/// - bundle container: the first bundle in listing order is opened
/// - other directories: the [`locator`] picks the executable
pub fn launch(
    path: &Path,
    preferred: Option<&str>,
    platform: Platform,
    reporter: &dyn Reporter,
) -> Result<Launched> {
    let kind = classify(path, platform)?;
    reporter.step(&format!("Launching {} ({kind})", path.display()));

    let target = match kind {
        ApplicationType::SingleFile | ApplicationType::MacBundle => path.to_path_buf(),
        ApplicationType::BundleContainerDirectory => {
            first_bundle(path, platform)?.ok_or_else(|| UpdaterError::NoExecutableFound {
                path: path.display().to_string(),
            })?
        }
        ApplicationType::PlainDirectoryWithExecutables | ApplicationType::GenericDirectory => {
            locator::locate(path, preferred, platform)?
        }
    };

    let pid = if platform.is_bundle_dir(&target) {
        reporter.detail(&format!("Opening bundle {}", target.display()));
        spawn_detached(Command::new(BUNDLE_OPENER).arg(&target), &target)?
    } else {
        reporter.detail(&format!("Starting {}", target.display()));
        spawn_detached(&mut Command::new(&target), &target)?
    };

    reporter.step(&format!("Launched {} with PID {pid}", target.display()));
    Ok(Launched { pid, target })
}

/// First bundle directory directly inside `dir`, in listing order
pub fn first_bundle(dir: &Path, platform: Platform) -> Result<Option<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| read_failed(dir, &e))?;

    Ok(entries
        .flatten()
        .map(|entry| entry.path())
        .find(|path| platform.is_bundle_dir(path)))
}

/// Start `command` detached, with the working directory set to the folder
/// holding `target`
fn spawn_detached(command: &mut Command, target: &Path) -> Result<u32> {
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        command.current_dir(parent);
    }

    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    detach(command);

    let child = command.spawn().map_err(|e| launch_failed(target, e))?;
    Ok(child.id())
}

#[cfg(unix)]
fn detach(command: &mut Command) {
    use std::os::unix::process::CommandExt;
    command.process_group(0);
}

#[cfg(windows)]
fn detach(command: &mut Command) {
    use std::os::windows::process::CommandExt;
    use windows::Win32::System::Threading::{CREATE_NEW_PROCESS_GROUP, DETACHED_PROCESS};
    command.creation_flags(DETACHED_PROCESS.0 | CREATE_NEW_PROCESS_GROUP.0);
}

#[cfg(not(any(unix, windows)))]
fn detach(_command: &mut Command) {}
