//! Executable discovery inside an application directory
//!
//! "Executable" depends on the platform:
//! - POSIX: any permission execute bit is set
//! - Windows: the extension is one of `.exe .com .bat .cmd`
//! - macOS: a bundle directory counts as one executable unit
//!
//! Candidates come back in directory-listing order, which is not sorted and
//! not stable across filesystems. Callers get "some valid executable", never
//! a particular one, unless they ask for it by name.

use std::fs::{self, Metadata};
use std::path::{Path, PathBuf};

use crate::domain::Platform;
use crate::error::{Result, UpdaterError};

/// Executable candidates directly inside `dir`, in listing order
///
/// Unreadable entries are skipped. A missing or unreadable `dir` yields no
/// candidates.
pub fn find_executables(dir: &Path, platform: Platform) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut executables = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(metadata) = fs::metadata(&path) else {
            continue;
        };

        if metadata.is_dir() {
            if platform.is_bundle_name(&entry.file_name()) {
                executables.push(path);
            }
            continue;
        }

        if is_executable(&path, &metadata, platform) {
            executables.push(path);
        }
    }

    executables
}

/// Whether a regular file is executable on `platform`
pub fn is_executable(path: &Path, metadata: &Metadata, platform: Platform) -> bool {
    if !metadata.is_file() {
        return false;
    }

    if platform.uses_permission_bits() {
        return has_execute_bit(metadata);
    }

    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .is_some_and(|ext| platform.executable_extensions().contains(&ext.as_str()))
}

#[cfg(unix)]
fn has_execute_bit(metadata: &Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn has_execute_bit(_metadata: &Metadata) -> bool {
    false
}

/// All candidates across the platform's search directories, in probe order
pub fn candidates(root: &Path, platform: Platform) -> Vec<PathBuf> {
    platform
        .executable_search_dirs(root)
        .iter()
        .filter(|dir| dir.is_dir())
        .flat_map(|dir| find_executables(dir, platform))
        .collect()
}

/// Find the best executable to launch in `root`
///
/// The preferred name wins when one of the candidates matches it,
/// case-insensitively and ignoring a Windows executable extension on either
/// side. Otherwise the first candidate is returned.
pub fn locate(root: &Path, preferred: Option<&str>, platform: Platform) -> Result<PathBuf> {
    let found = candidates(root, platform);

    if let Some(name) = preferred.filter(|n| !n.is_empty()) {
        let wanted = platform.normalize_executable_name(name);
        let matched = found.iter().find(|candidate| {
            candidate
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| platform.normalize_executable_name(n) == wanted)
        });
        if let Some(path) = matched {
            return Ok(path.clone());
        }
    }

    found
        .into_iter()
        .next()
        .ok_or_else(|| UpdaterError::NoExecutableFound {
            path: root.display().to_string(),
        })
}
