//! Validation errors

use std::path::Path;

use super::UpdaterError;

pub fn not_found(path: &Path) -> UpdaterError {
    UpdaterError::PathNotFound {
        path: path.display().to_string(),
    }
}

pub fn not_a_directory(path: &Path) -> UpdaterError {
    UpdaterError::NotADirectory {
        path: path.display().to_string(),
    }
}

pub fn bundle_argument(path: &Path) -> UpdaterError {
    UpdaterError::BundleArgument {
        path: path.display().to_string(),
    }
}

pub fn nested(outer: &Path, inner: &Path) -> UpdaterError {
    UpdaterError::NestedPaths {
        outer: outer.display().to_string(),
        inner: inner.display().to_string(),
    }
}


pub fn invalid_argument(message: impl Into<String>) -> UpdaterError {
    UpdaterError::InvalidArgument {
        message: message.into(),
    }
}
