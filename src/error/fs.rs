//! File system errors

use std::path::Path;

use super::UpdaterError;

/// Creates a read failure for `path`
pub fn read_failed(path: &Path, err: &std::io::Error) -> UpdaterError {
    UpdaterError::FileReadFailed {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

/// Creates a write failure for `path`
pub fn write_failed(path: &Path, err: &std::io::Error) -> UpdaterError {
    UpdaterError::FileWriteFailed {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

/// Creates an IO error with operation context
pub fn io_error(message: impl Into<String>) -> UpdaterError {
    UpdaterError::IoError {
        message: message.into(),
    }
}

/// Creates a stat failure for `path`
pub fn stat_failed(path: &Path, err: &std::io::Error) -> UpdaterError {
    UpdaterError::StatFailed {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}
