//! Whole-bundle copy backends
//!
//! On macOS a bundle is copied with `ditto`, which keeps extended
//! attributes, resource forks and code signatures intact. Elsewhere, and in
//! tests, a `walkdir` based copy that keeps permission bits and symlinks
//! stands in.

use std::path::Path;
use std::process::{Command, Stdio};

use walkdir::WalkDir;

use super::{copy_file, copy_permissions, copy_symlink, ensure_dir};
use crate::domain::Platform;
use crate::error::Result;
use crate::error::fs::{io_error, read_failed};

/// Copies a whole bundle directory to a path that does not exist yet
pub trait BundleCopier {
    /// Name shown in progress messages
    fn name(&self) -> &'static str;

    /// Copy the bundle at `src` to `dst`
    fn copy_bundle(&self, src: &Path, dst: &Path) -> Result<()>;
}

/// Copy through Apple's `ditto` utility
#[derive(Debug, Default, Clone, Copy)]
pub struct DittoCopier;

impl BundleCopier for DittoCopier {
    fn name(&self) -> &'static str {
        "ditto"
    }

    fn copy_bundle(&self, src: &Path, dst: &Path) -> Result<()> {
        let output = Command::new("ditto")
            .arg(src)
            .arg(dst)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| io_error(format!("failed to run ditto: {e}")))?;

        if !output.status.success() {
            return Err(io_error(format!(
                "ditto failed ({}): {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(())
    }
}

/// Byte-level recursive copy
#[derive(Debug, Default, Clone, Copy)]
pub struct RecursiveCopier;

impl BundleCopier for RecursiveCopier {
    fn name(&self) -> &'static str {
        "recursive copy"
    }

    fn copy_bundle(&self, src: &Path, dst: &Path) -> Result<()> {
        if !src.is_dir() {
            return Err(read_failed(
                src,
                &std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a directory"),
            ));
        }

        let mut dirs = Vec::new();

        for entry in WalkDir::new(src).follow_links(false) {
            let entry =
                entry.map_err(|e| io_error(format!("failed to walk {}: {e}", src.display())))?;
            let relative = entry
                .path()
                .strip_prefix(src)
                .map_err(|e| io_error(e.to_string()))?;
            let target = dst.join(relative);
            let file_type = entry.file_type();

            if file_type.is_dir() {
                ensure_dir(&target)?;
                dirs.push((entry.path().to_path_buf(), target));
            } else if file_type.is_symlink() {
                copy_symlink(entry.path(), &target)?;
            } else {
                copy_file(entry.path(), &target)?;
            }
        }

        // Deepest first, so read-only directories are locked after their contents
        for (source, target) in dirs.iter().rev() {
            copy_permissions(source, target)?;
        }

        Ok(())
    }
}

/// Copier used for bundles on `platform`
pub fn default_copier(platform: Platform) -> Box<dyn BundleCopier> {
    match platform {
        Platform::MacOs => Box::new(DittoCopier),
        Platform::Windows | Platform::Linux => Box::new(RecursiveCopier),
    }
}
