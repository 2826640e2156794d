//! Replacement engine and launch errors

use std::path::Path;

use super::UpdaterError;

pub fn backup_failed(cause: &UpdaterError) -> UpdaterError {
    UpdaterError::BackupFailed {
        reason: cause.to_string(),
    }
}

pub fn copy_failed(cause: &UpdaterError) -> UpdaterError {
    UpdaterError::CopyFailed {
        reason: cause.to_string(),
    }
}

pub fn rollback_failed(
    copy_cause: &UpdaterError,
    rollback_cause: &UpdaterError,
    backup: &Path,
) -> UpdaterError {
    UpdaterError::RollbackFailed {
        copy_reason: copy_cause.to_string(),
        rollback_reason: rollback_cause.to_string(),
        backup: backup.display().to_string(),
    }
}

pub fn launch_failed(path: &Path, reason: impl ToString) -> UpdaterError {
    UpdaterError::LaunchFailed {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}
