//! Error types and handling for atom-updater
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.
//!
//! This module is organized into sub-modules by error domain:
//! - [`validation`]: Argument and path validation errors (nothing mutated yet)
//! - [`replace`]: Replacement engine and launch errors
//! - [`fs`]: File system errors

pub mod fs;
pub mod replace;
pub mod validation;

use miette::Diagnostic;
use thiserror::Error;

use crate::domain::ApplicationType;

/// How bad an error is for the directory being updated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Nothing was mutated, or the engine restored the original content
    Recoverable,
    /// The target directory may hold a mix of old and new content
    Critical,
}

/// Main error type for atom-updater operations
#[derive(Error, Diagnostic, Debug)]
pub enum UpdaterError {
    // Validation errors
    #[error("Path does not exist: {path}")]
    #[diagnostic(code(atom_updater::validation::not_found))]
    PathNotFound { path: String },

    #[error("Path must be a directory, not a file: {path}")]
    #[diagnostic(
        code(atom_updater::validation::not_a_directory),
        help("Single files are not supported, pass the directory that contains the application")
    )]
    NotADirectory { path: String },

    #[error("Path cannot be an app bundle, it must be a directory: {path}")]
    #[diagnostic(
        code(atom_updater::validation::bundle_argument),
        help("Pass the directory that contains the .app bundle instead of the bundle itself")
    )]
    BundleArgument { path: String },

    #[error("Current and new paths are the same: {path}")]
    #[diagnostic(code(atom_updater::validation::same_path))]
    SamePath { path: String },

    #[error("Paths must not be nested: {inner} is inside {outer}")]
    #[diagnostic(
        code(atom_updater::validation::nested_paths),
        help("Stage the new version outside of the application directory")
    )]
    NestedPaths { outer: String, inner: String },

    #[error("Invalid argument: {message}")]
    #[diagnostic(code(atom_updater::validation::invalid_argument))]
    InvalidArgument { message: String },

    #[error("Checksum mismatch for {path}: expected {expected}, got {actual}")]
    #[diagnostic(
        code(atom_updater::validation::checksum_mismatch),
        help("The staged update does not match the expected content, download it again")
    )]
    ChecksumMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    // Classification errors
    #[error("Failed to inspect path {path}: {reason}")]
    #[diagnostic(code(atom_updater::detect::stat_failed))]
    StatFailed { path: String, reason: String },

    #[error(
        "Incompatible application types: current is {current}, new is {new}. Both must be either files or directories"
    )]
    #[diagnostic(code(atom_updater::replace::type_mismatch))]
    TypeMismatch {
        current: ApplicationType,
        new: ApplicationType,
    },

    #[error("Unsupported application type for replacement: {kind}")]
    #[diagnostic(
        code(atom_updater::replace::unsupported_type),
        help("Only directory-based updates are supported")
    )]
    UnsupportedType { kind: ApplicationType },

    // Replacement errors
    #[error("Failed to back up current files: {reason}")]
    #[diagnostic(code(atom_updater::replace::backup_failed))]
    BackupFailed { reason: String },

    #[error("Failed to copy new files, original content restored: {reason}")]
    #[diagnostic(code(atom_updater::replace::copy_failed))]
    CopyFailed { reason: String },

    #[error("Rollback failed after copy error ({copy_reason}): {rollback_reason}")]
    #[diagnostic(
        code(atom_updater::replace::rollback_failed),
        severity(Error),
        help("The original files are still in {backup}, restore them manually")
    )]
    RollbackFailed {
        copy_reason: String,
        rollback_reason: String,
        backup: String,
    },

    // Launch errors
    #[error("No executable found in {path}")]
    #[diagnostic(
        code(atom_updater::launch::no_executable),
        help("Use --app-name to name the executable to start")
    )]
    NoExecutableFound { path: String },

    #[error("Failed to launch {path}: {reason}")]
    #[diagnostic(code(atom_updater::launch::failed))]
    LaunchFailed { path: String, reason: String },

    // Process errors
    #[error("Process {pid} did not exit within {seconds}s")]
    #[diagnostic(code(atom_updater::process::timeout))]
    WaitTimedOut { pid: u32, seconds: u64 },

    #[error("Failed to wait for process {pid}: {reason}")]
    #[diagnostic(code(atom_updater::process::wait_failed))]
    ProcessWaitFailed { pid: u32, reason: String },

    // File system errors
    #[error("Failed to read file: {path}: {reason}")]
    #[diagnostic(code(atom_updater::fs::read_failed))]
    FileReadFailed { path: String, reason: String },

    #[error("Failed to write file: {path}: {reason}")]
    #[diagnostic(code(atom_updater::fs::write_failed))]
    FileWriteFailed { path: String, reason: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(atom_updater::fs::io_error))]
    IoError { message: String },
}

impl UpdaterError {
    /// Severity of the error for the target directory
    pub fn severity(&self) -> Severity {
        match self {
            UpdaterError::RollbackFailed { .. } => Severity::Critical,
            _ => Severity::Recoverable,
        }
    }

    /// Process exit code for this error
    ///
    /// A failed rollback gets its own code so wrappers can tell that the
    /// application directory needs manual attention.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            Severity::Critical => 2,
            Severity::Recoverable => 1,
        }
    }
}

impl From<std::io::Error> for UpdaterError {
    fn from(err: std::io::Error) -> Self {
        UpdaterError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for UpdaterError {
    fn from(err: serde_json::Error) -> Self {
        UpdaterError::IoError {
            message: err.to_string(),
        }
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, UpdaterError>;

#[cfg(test)]
mod tests;
