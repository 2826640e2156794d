//! Common test utilities for atom-updater integration tests

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

/// Above any real pid_max, so the updater treats it as already exited
#[allow(dead_code)]
pub const UNUSED_PID: &str = "2147483647";

/// A scratch area holding an installed app directory and a staged update
#[allow(dead_code)]
pub struct TestWorkspace {
    /// Temporary directory
    #[allow(dead_code)]
    pub temp: TempDir,
    /// Root of the scratch area
    pub path: PathBuf,
    /// Installed application directory
    pub current: PathBuf,
    /// Staged new version
    pub staged: PathBuf,
}

impl TestWorkspace {
    /// Create a workspace with empty `app/` and `staged/` directories
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let path = temp.path().to_path_buf();
        let current = path.join("app");
        let staged = path.join("staged");
        std::fs::create_dir_all(&current).expect("Failed to create app directory");
        std::fs::create_dir_all(&staged).expect("Failed to create staged directory");
        Self {
            temp,
            path,
            current,
            staged,
        }
    }

    /// Write a file relative to the workspace root
    pub fn write_file(&self, path: &str, content: &str) {
        write(&self.path.join(path), content);
    }

    /// Write an executable script relative to the workspace root
    #[allow(dead_code)]
    #[cfg(unix)]
    pub fn write_script(&self, path: &str, body: &str) {
        use std::os::unix::fs::PermissionsExt;

        let file_path = self.path.join(path);
        write(&file_path, &format!("#!/bin/sh\n{body}\n"));
        std::fs::set_permissions(&file_path, std::fs::Permissions::from_mode(0o755))
            .expect("Failed to make script executable");
    }

    /// Read a file relative to the workspace root
    pub fn read_file(&self, path: &str) -> String {
        std::fs::read_to_string(self.path.join(path)).expect("Failed to read file")
    }

    /// Check if a path exists relative to the workspace root
    pub fn file_exists(&self, path: &str) -> bool {
        self.path.join(path).exists()
    }

    /// Names of the entries directly inside `dir`, sorted
    #[allow(dead_code)]
    pub fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .expect("Failed to read directory")
            .map(|e| {
                e.expect("Failed to read entry")
                    .file_name()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        names.sort();
        names
    }

    /// Updater command for this workspace: `<pid> app staged`, no log file
    #[allow(dead_code)]
    pub fn update_cmd(&self) -> Command {
        let mut cmd = updater_cmd();
        cmd.arg(UNUSED_PID)
            .arg(&self.current)
            .arg(&self.staged)
            .arg("--no-log-file");
        cmd
    }
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

/// The atom-updater binary, with logging env cleared
// Temporary fix for deprecated cargo_bin - will be updated when build-dir issues are resolved
#[allow(deprecated)]
pub fn updater_cmd() -> Command {
    let mut cmd = Command::cargo_bin("atom-updater").expect("binary not built");
    cmd.env_remove("ATOM_UPDATER_LOG")
        .env_remove("ATOM_UPDATER_LOG_FILE");
    cmd
}

fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create parent directory");
    }
    std::fs::write(path, content).expect("Failed to write file");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_creation() {
        let workspace = TestWorkspace::new();
        assert!(workspace.current.is_dir());
        assert!(workspace.staged.is_dir());
    }

    #[test]
    fn test_workspace_file_operations() {
        let workspace = TestWorkspace::new();
        workspace.write_file("app/test/file.txt", "hello");
        assert!(workspace.file_exists("app/test/file.txt"));
        assert_eq!(workspace.read_file("app/test/file.txt"), "hello");
        assert_eq!(TestWorkspace::entries(&workspace.current), vec!["test"]);
    }
}
