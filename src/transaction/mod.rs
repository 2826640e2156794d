//! Atomic replacement of an application directory
//!
//! A replacement runs as a [`BackupTransaction`]:
//!
//! ```text
//! BackupCreated -> ContentsBackedUp -> NewContentsCopied -> BackupRemoved
//!                      \                  /
//!                       RollbackInProgress -> RolledBack
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut transaction = BackupTransaction::begin(current, ops, reporter)?;
//! transaction.install(new)?;
//!
//! // On success:
//! let cleaned = transaction.commit();
//!
//! // On error (automatic via Drop if not committed):
//! // the backup is moved back into place
//! ```
//!
//! The backup lives inside the directory being replaced, so every move is a
//! same-filesystem rename. Nothing about an attempt is persisted: after a
//! crash the `.backup.<token>` directory is the only trace and has to be
//! recovered by hand.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::detection::classify;
use crate::domain::{ApplicationType, Platform};
use crate::error::fs::{io_error, write_failed};
use crate::error::replace::{backup_failed, copy_failed, rollback_failed};
use crate::error::{Result, UpdaterError};
use crate::fs::{
    BundleCopier, TreeOps, default_copier, list_dir, remove_if_exists, remove_path, strategy_for,
};
use crate::ui::Reporter;

/// Name prefix of the backup directory created inside the target
pub const BACKUP_PREFIX: &str = ".backup.";

/// Attempts at finding an unused backup name before giving up
const BACKUP_NAME_ATTEMPTS: u32 = 16;

/// Progress of one replacement attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplacementState {
    BackupCreated,
    ContentsBackedUp,
    NewContentsCopied,
    BackupRemoved,
    RollbackInProgress,
    RolledBack,
}

/// What a successful replacement did
#[derive(Debug, Clone)]
pub struct ReplacementOutcome {
    pub current_type: ApplicationType,
    pub new_type: ApplicationType,
    /// Walk used for backup, copy and restore
    pub strategy: &'static str,
    /// Name of the backup directory used during the attempt
    pub backup_name: String,
    /// False when the backup directory could not be deleted after commit
    pub backup_removed: bool,
}

/// Whether `name` looks like a backup directory name
pub fn is_backup_name(name: &OsStr) -> bool {
    name.to_str().is_some_and(|n| n.starts_with(BACKUP_PREFIX))
}

/// Replaces application directories on one platform
pub struct Replacer {
    platform: Platform,
    copier: Box<dyn BundleCopier>,
}

impl Replacer {
    /// Replacer using the platform's default bundle copier
    pub fn new(platform: Platform) -> Self {
        Self::with_copier(platform, default_copier(platform))
    }

    pub fn with_copier(platform: Platform, copier: Box<dyn BundleCopier>) -> Self {
        Self { platform, copier }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Replace the contents of `current` with a copy of the contents of `new`
    ///
    /// Both paths are classified first and incompatible or unsupported
    /// combinations are rejected before anything is touched. The walk is
    /// picked once from the current type and used for every phase.
    pub fn replace(
        &self,
        current: &Path,
        new: &Path,
        reporter: &dyn Reporter,
    ) -> Result<ReplacementOutcome> {
        let current_type = classify(current, self.platform)?;
        let new_type = classify(new, self.platform)?;
        reporter.step(&format!(
            "Current: {} ({current_type}), new: {} ({new_type})",
            current.display(),
            new.display()
        ));

        check_compatible(current_type, new_type)?;

        let ops = strategy_for(current_type, self.platform, self.copier.as_ref());
        reporter.detail(&format!("Using {} walk", ops.name()));

        let (backup_name, backup_removed) = replace_with(current, new, ops.as_ref(), reporter)?;

        Ok(ReplacementOutcome {
            current_type,
            new_type,
            strategy: ops.name(),
            backup_name,
            backup_removed,
        })
    }
}

/// Reject type pairs the engine will not replace
pub fn check_compatible(current: ApplicationType, new: ApplicationType) -> Result<()> {
    if !current.is_compatible_with(new) {
        return Err(UpdaterError::TypeMismatch { current, new });
    }

    // Compatible and file-like on one side means file-like on both
    if current.is_file_like() {
        return Err(UpdaterError::UnsupportedType { kind: current });
    }

    Ok(())
}

/// Run backup, copy and commit with an explicit walk
///
/// Returns the backup directory name and whether it was removed.
pub(crate) fn replace_with(
    current: &Path,
    new: &Path,
    ops: &dyn TreeOps,
    reporter: &dyn Reporter,
) -> Result<(String, bool)> {
    let mut transaction = BackupTransaction::begin(current, ops, reporter)?;
    transaction.install(new)?;
    reporter.detail(&format!(
        "{:?}, removing {}",
        transaction.state(),
        transaction.backup_path().display()
    ));

    let name = transaction.backup_name().to_string_lossy().into_owned();
    let removed = transaction.commit();
    Ok((name, removed))
}

/// One backup/copy attempt on a target directory
///
/// Owns the backup directory. Dropping an uncommitted transaction whose
/// contents were backed up moves the backup back.
pub struct BackupTransaction<'a> {
    current: PathBuf,
    backup: PathBuf,
    backup_name: OsString,
    ops: &'a dyn TreeOps,
    reporter: &'a dyn Reporter,
    state: ReplacementState,
}

impl<'a> BackupTransaction<'a> {
    /// Create the backup directory and move every entry of `current` into it
    ///
    /// If the move fails part way, whatever was moved is put back and the
    /// backup directory is deleted before [`UpdaterError::BackupFailed`] is
    /// returned.
    pub fn begin(
        current: &Path,
        ops: &'a dyn TreeOps,
        reporter: &'a dyn Reporter,
    ) -> Result<Self> {
        let (backup, backup_name) = create_backup_dir(current).map_err(|e| backup_failed(&e))?;
        reporter.step(&format!("Created backup directory {}", backup.display()));

        let mut transaction = Self {
            current: current.to_path_buf(),
            backup,
            backup_name,
            ops,
            reporter,
            state: ReplacementState::BackupCreated,
        };

        reporter.step("Backing up current files");
        let moved = ops.move_tree(
            current,
            &transaction.backup,
            Some(transaction.backup_name.as_os_str()),
            reporter,
        );
        if let Err(e) = moved {
            return Err(transaction.abort_backup(e));
        }

        transaction.state = ReplacementState::ContentsBackedUp;
        Ok(transaction)
    }

    /// Current state of the attempt
    pub fn state(&self) -> ReplacementState {
        self.state
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup
    }

    pub fn backup_name(&self) -> &OsStr {
        &self.backup_name
    }

    /// Copy the contents of `new` into the emptied target
    ///
    /// On failure the original contents are restored and
    /// [`UpdaterError::CopyFailed`] is returned, or
    /// [`UpdaterError::RollbackFailed`] when they could not be restored.
    pub fn install(&mut self, new: &Path) -> Result<()> {
        self.reporter
            .step(&format!("Copying new files from {}", new.display()));

        if let Err(copy_error) = self.ops.copy_tree(new, &self.current, self.reporter) {
            self.reporter
                .warn(&format!("Copy failed, rolling back: {copy_error}"));

            return match self.rollback() {
                Ok(()) => Err(copy_failed(&copy_error)),
                Err(rollback_error) => {
                    self.reporter.critical(&format!(
                        "Rollback failed, {} may hold a mix of old and new files. Original files remain in {}: {rollback_error}",
                        self.current.display(),
                        self.backup.display()
                    ));
                    Err(rollback_failed(&copy_error, &rollback_error, &self.backup))
                }
            };
        }

        self.state = ReplacementState::NewContentsCopied;
        Ok(())
    }

    /// Put the original contents back
    ///
    /// Entries copied into the target so far are deleted first, then the
    /// backup is moved back and the empty backup directory removed. On
    /// failure the backup directory is left in place.
    pub fn rollback(&mut self) -> Result<()> {
        self.state = ReplacementState::RollbackInProgress;
        self.reporter.step("Restoring original files from backup");

        for entry in list_dir(&self.current)? {
            if entry.file_name() == self.backup_name {
                continue;
            }
            remove_path(&entry.path())?;
        }

        self.ops.restore_tree(&self.backup, &self.current, self.reporter)?;
        fs::remove_dir(&self.backup).map_err(|e| write_failed(&self.backup, &e))?;

        self.state = ReplacementState::RolledBack;
        self.reporter.step("Original files restored");
        Ok(())
    }

    /// Finish the attempt by deleting the backup directory
    ///
    /// The replacement is already in place, so a failed delete is only a
    /// warning. Returns whether the backup is gone.
    pub fn commit(mut self) -> bool {
        self.reporter.step("Removing backup directory");

        let removed = match remove_if_exists(&self.backup) {
            Ok(()) => true,
            Err(e) => {
                self.reporter.warn(&format!(
                    "Failed to remove backup directory {}: {e}",
                    self.backup.display()
                ));
                false
            }
        };

        self.state = ReplacementState::BackupRemoved;
        removed
    }

    fn abort_backup(&mut self, cause: UpdaterError) -> UpdaterError {
        self.reporter
            .warn(&format!("Backup failed, putting entries back: {cause}"));
        self.state = ReplacementState::RollbackInProgress;

        if let Err(restore) = self.ops.restore_tree(&self.backup, &self.current, self.reporter) {
            self.reporter.critical(&format!(
                "Failed to put entries back from {}: {restore}",
                self.backup.display()
            ));
            return rollback_failed(&cause, &restore, &self.backup);
        }

        if let Err(e) = remove_if_exists(&self.backup) {
            self.reporter.warn(&format!(
                "Failed to remove backup directory {}: {e}",
                self.backup.display()
            ));
        }

        self.state = ReplacementState::RolledBack;
        backup_failed(&cause)
    }
}

impl Drop for BackupTransaction<'_> {
    fn drop(&mut self) {
        if matches!(
            self.state,
            ReplacementState::ContentsBackedUp | ReplacementState::NewContentsCopied
        ) {
            if let Err(e) = self.rollback() {
                self.reporter.critical(&format!(
                    "Rollback failed, original files remain in {}: {e}",
                    self.backup.display()
                ));
            }
        }
    }
}

/// Create a fresh `.backup.<token>` directory inside `current`
///
/// The token is the hex nanosecond timestamp, bumped on collision.
fn create_backup_dir(current: &Path) -> Result<(PathBuf, OsString)> {
    let mut token = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();

    for _ in 0..BACKUP_NAME_ATTEMPTS {
        let name = OsString::from(format!("{BACKUP_PREFIX}{token:x}"));
        let path = current.join(&name);

        match fs::create_dir(&path) {
            Ok(()) => return Ok((path, name)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => token += 1,
            Err(e) => return Err(write_failed(&path, &e)),
        }
    }

    Err(io_error(format!(
        "no free backup directory name in {}",
        current.display()
    )))
}
