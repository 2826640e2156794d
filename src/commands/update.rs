//! Update command implementation
//!
//! The update process:
//! 1. Validate both directories (nothing is touched on failure)
//! 2. Verify the staged checksum, if one was given
//! 3. Wait for the running application to exit
//! 4. Atomically replace the application directory
//! 5. Launch the new version (failure here is only a warning)
//! 6. Print the run summary

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::Cli;
use crate::domain::{BUNDLE_SUFFIX, Platform};
use crate::error::fs::stat_failed;
use crate::error::validation::{
    bundle_argument, invalid_argument, nested, not_a_directory, not_found,
};
use crate::error::{Result, UpdaterError};
use crate::hash;
use crate::launcher;
use crate::process;
use crate::transaction::Replacer;
use crate::ui::summary::{self, LaunchReport, UpdateSummary};
use crate::ui::{Reporter, TracingReporter};

/// Everything one update run needs
#[derive(Debug, Clone)]
pub struct UpdateRequest {
    pub pid: u32,
    pub current_dir: PathBuf,
    pub new_dir: PathBuf,
    pub app_name: Option<String>,
    pub launch: bool,
    pub checksum: Option<String>,
    pub wait_timeout: Option<Duration>,
}

impl From<&Cli> for UpdateRequest {
    fn from(cli: &Cli) -> Self {
        Self {
            pid: cli.pid,
            current_dir: cli.current_dir.clone(),
            new_dir: cli.new_dir.clone(),
            app_name: cli.app_name.clone(),
            launch: !cli.no_launch,
            checksum: cli.checksum.clone(),
            wait_timeout: cli.wait_timeout(),
        }
    }
}

/// Run the update command
pub fn run(cli: &Cli) -> Result<()> {
    let platform = Platform::current();
    let replacer = Replacer::new(platform);

    let summary = execute(&UpdateRequest::from(cli), &replacer, &TracingReporter)?;
    summary::print(&summary, cli.json)
}

/// Validate, wait, replace and launch
pub fn execute(
    request: &UpdateRequest,
    replacer: &Replacer,
    reporter: &dyn Reporter,
) -> Result<UpdateSummary> {
    let platform = replacer.platform();

    reporter.step(&format!(
        "Starting update on {platform}: PID {}, current {}, new {}",
        request.pid,
        request.current_dir.display(),
        request.new_dir.display()
    ));
    if let Some(name) = &request.app_name {
        reporter.step(&format!("App name: {name}"));
    }

    validate_options(request)?;
    let (current, new) = validate_paths(&request.current_dir, &request.new_dir)?;

    let checksum = match &request.checksum {
        Some(expected) => {
            reporter.step(&format!("Verifying checksum of {}", new.display()));
            let actual = hash::verify_path(&new, expected)?;
            reporter.step("Checksum verified");
            Some(actual)
        }
        None => None,
    };

    match process::wait_for_exit(request.pid, request.wait_timeout, reporter) {
        Ok(()) => {}
        Err(e @ UpdaterError::WaitTimedOut { .. }) => return Err(e),
        Err(e) => {
            reporter.warn(&format!("{e}, continuing with update anyway"));
        }
    }

    let outcome = replacer.replace(&current, &new, reporter)?;
    reporter.step("Atomic replacement completed");

    let launch = if request.launch {
        match launcher::launch(&current, request.app_name.as_deref(), platform, reporter) {
            Ok(launched) => LaunchReport::Launched {
                pid: launched.pid,
                target: launched.target,
            },
            Err(e) => {
                reporter.warn(&format!("Failed to launch updated application: {e}"));
                LaunchReport::Failed {
                    error: e.to_string(),
                }
            }
        }
    } else {
        reporter.step("Launch skipped");
        LaunchReport::Skipped
    };

    reporter.step("Update process completed successfully");

    Ok(UpdateSummary {
        version: env!("CARGO_PKG_VERSION"),
        platform,
        pid: request.pid,
        current_path: current,
        new_path: new,
        current_type: outcome.current_type,
        new_type: outcome.new_type,
        strategy: outcome.strategy,
        backup_name: outcome.backup_name,
        backup_removed: outcome.backup_removed,
        checksum,
        launch,
    })
}

/// Reject option values that are present but empty
fn validate_options(request: &UpdateRequest) -> Result<()> {
    if request.app_name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(invalid_argument("--app-name must not be empty"));
    }
    if request.checksum.as_deref().is_some_and(|c| {
        let c = c.trim();
        c.strip_prefix(hash::HASH_PREFIX).unwrap_or(c).is_empty()
    }) {
        return Err(invalid_argument("--checksum must not be empty"));
    }
    Ok(())
}

/// Check both directories and return their canonical forms
///
/// Both must exist, be directories and not be bundles themselves. They must
/// also differ and not contain one another.
pub fn validate_paths(current: &Path, new: &Path) -> Result<(PathBuf, PathBuf)> {
    let current = validate_dir(current)?;
    let new = validate_dir(new)?;

    if current == new {
        return Err(UpdaterError::SamePath {
            path: current.display().to_string(),
        });
    }
    if new.starts_with(&current) {
        return Err(nested(&current, &new));
    }
    if current.starts_with(&new) {
        return Err(nested(&new, &current));
    }

    Ok((current, new))
}

fn validate_dir(path: &Path) -> Result<PathBuf> {
    let metadata = match std::fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(not_found(path)),
        Err(e) => return Err(stat_failed(path, &e)),
    };
    if !metadata.is_dir() {
        return Err(not_a_directory(path));
    }

    let canonical = dunce::canonicalize(path).map_err(|e| stat_failed(path, &e))?;

    // Bundles are rejected whatever the host platform
    if [path, canonical.as_path()].iter().any(|p| is_bundle_path(p)) {
        return Err(bundle_argument(path));
    }

    Ok(canonical)
}

fn is_bundle_path(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(BUNDLE_SUFFIX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::RecursiveCopier;
    use crate::ui::{Level, RecordingReporter, SilentReporter};
    use std::fs;
    use tempfile::TempDir;

    /// Above any real pid_max, so never a live process
    const UNUSED_PID: u32 = i32::MAX as u32;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn request(current: &Path, new: &Path) -> UpdateRequest {
        UpdateRequest {
            pid: UNUSED_PID,
            current_dir: current.to_path_buf(),
            new_dir: new.to_path_buf(),
            app_name: None,
            launch: false,
            checksum: None,
            wait_timeout: None,
        }
    }

    fn setup() -> (TempDir, PathBuf, PathBuf) {
        let temp = TempDir::new().unwrap();
        let current = temp.path().join("app");
        let new = temp.path().join("staged");
        write(&current, "readme.txt", "v1");
        write(&new, "readme.txt", "v2");
        (temp, current, new)
    }

    fn replacer() -> Replacer {
        Replacer::with_copier(Platform::Linux, Box::new(RecursiveCopier))
    }

    #[test]
    fn test_execute_replaces_and_skips_launch() {
        let (_temp, current, new) = setup();

        let summary = execute(&request(&current, &new), &replacer(), &SilentReporter).unwrap();

        assert_eq!(fs::read_to_string(current.join("readme.txt")).unwrap(), "v2");
        assert!(matches!(summary.launch, LaunchReport::Skipped));
        assert_eq!(summary.current_path, dunce::canonicalize(&current).unwrap());
        assert!(summary.backup_removed);
    }

    #[test]
    fn test_launch_failure_is_a_warning() {
        let (_temp, current, new) = setup();
        let mut req = request(&current, &new);
        req.launch = true;
        let reporter = RecordingReporter::default();

        let summary = execute(&req, &replacer(), &reporter).unwrap();

        assert!(matches!(summary.launch, LaunchReport::Failed { .. }));
        assert_eq!(fs::read_to_string(current.join("readme.txt")).unwrap(), "v2");
        assert!(
            reporter
                .messages(Level::Warn)
                .iter()
                .any(|m| m.contains("Failed to launch"))
        );
    }

    #[test]
    fn test_checksum_mismatch_changes_nothing() {
        let (_temp, current, new) = setup();
        let mut req = request(&current, &new);
        req.checksum = Some("blake3:deadbeef".to_string());

        let err = execute(&req, &replacer(), &SilentReporter).unwrap_err();

        assert!(matches!(err, UpdaterError::ChecksumMismatch { .. }));
        assert_eq!(fs::read_to_string(current.join("readme.txt")).unwrap(), "v1");
    }

    #[test]
    fn test_checksum_match_is_reported() {
        let (_temp, current, new) = setup();
        let mut req = request(&current, &new);
        let expected = hash::hash_directory(&new).unwrap();
        req.checksum = Some(expected.clone());

        let summary = execute(&req, &replacer(), &SilentReporter).unwrap();
        assert_eq!(summary.checksum, Some(expected));
    }

    #[test]
    fn test_wait_timeout_aborts_before_replacing() {
        let (_temp, current, new) = setup();
        let mut req = request(&current, &new);
        req.pid = std::process::id();
        req.wait_timeout = Some(Duration::from_millis(100));

        let err = execute(&req, &replacer(), &SilentReporter).unwrap_err();

        assert!(matches!(err, UpdaterError::WaitTimedOut { .. }));
        assert_eq!(fs::read_to_string(current.join("readme.txt")).unwrap(), "v1");
    }

    #[test]
    fn test_empty_options_rejected() {
        let (_temp, current, new) = setup();

        let mut req = request(&current, &new);
        req.app_name = Some("  ".to_string());
        let err = execute(&req, &replacer(), &SilentReporter).unwrap_err();
        assert!(matches!(err, UpdaterError::InvalidArgument { .. }));

        let mut req = request(&current, &new);
        req.checksum = Some("blake3:".to_string());
        let err = execute(&req, &replacer(), &SilentReporter).unwrap_err();
        assert!(matches!(err, UpdaterError::InvalidArgument { .. }));

        assert_eq!(fs::read_to_string(current.join("readme.txt")).unwrap(), "v1");
    }

    #[test]
    fn test_validate_missing_path() {
        let (temp, current, _new) = setup();
        let err = validate_paths(&current, &temp.path().join("nope")).unwrap_err();
        assert!(matches!(err, UpdaterError::PathNotFound { .. }));
    }

    #[test]
    fn test_validate_rejects_files() {
        let (temp, current, _new) = setup();
        let file = temp.path().join("file.bin");
        fs::write(&file, "x").unwrap();

        let err = validate_paths(&file, &current).unwrap_err();
        assert!(matches!(err, UpdaterError::NotADirectory { .. }));
    }

    #[test]
    fn test_validate_rejects_bundles() {
        let (temp, current, _new) = setup();
        let bundle = temp.path().join("MyApp.app");
        fs::create_dir_all(bundle.join("Contents")).unwrap();

        let err = validate_paths(&current, &bundle).unwrap_err();
        assert!(matches!(err, UpdaterError::BundleArgument { .. }));
    }

    #[test]
    fn test_validate_rejects_same_and_nested() {
        let (_temp, current, _new) = setup();
        let inner = current.join("update");
        fs::create_dir(&inner).unwrap();

        assert!(matches!(
            validate_paths(&current, &current),
            Err(UpdaterError::SamePath { .. })
        ));
        assert!(matches!(
            validate_paths(&current, &inner),
            Err(UpdaterError::NestedPaths { .. })
        ));
        assert!(matches!(
            validate_paths(&inner, &current),
            Err(UpdaterError::NestedPaths { .. })
        ));
    }

    #[test]
    fn test_validate_canonicalizes() {
        let (_temp, current, new) = setup();
        let dotted = current.join("..").join("staged");

        let (_, resolved) = validate_paths(&current, &dotted).unwrap();
        assert_eq!(resolved, dunce::canonicalize(&new).unwrap());
    }
}
