//! Bundle-aware walk
//!
//! A bundle directory is never traversed entry by entry. During backup and
//! restore it is renamed whole. During copy it goes through a three-name
//! substitution so the destination is only ever fully old, fully new, or
//! briefly absent:
//!
//! 1. copy the new bundle to `<name>.new` with the [`BundleCopier`]
//! 2. rename an existing `<name>` to `<name>.old`
//! 3. rename `<name>.new` to `<name>`, putting `<name>.old` back on failure

use std::ffi::OsString;
use std::fs::FileType;
use std::path::{Path, PathBuf};

use super::{BundleCopier, TreeOps, remove_if_exists, rename};
use crate::domain::Platform;
use crate::error::Result;
use crate::ui::Reporter;

/// Sibling suffix holding a freshly copied bundle
pub const NEW_SUFFIX: &str = ".new";
/// Sibling suffix holding the bundle being replaced
pub const OLD_SUFFIX: &str = ".old";

/// Walk that treats bundle directories as atomic units
pub struct BundleTree<'a> {
    platform: Platform,
    copier: &'a dyn BundleCopier,
}

impl<'a> BundleTree<'a> {
    pub fn new(platform: Platform, copier: &'a dyn BundleCopier) -> Self {
        Self { platform, copier }
    }
}

impl TreeOps for BundleTree<'_> {
    fn name(&self) -> &'static str {
        "bundle-aware"
    }

    fn is_atomic_unit(&self, path: &Path, file_type: &FileType) -> bool {
        file_type.is_dir()
            && path
                .file_name()
                .is_some_and(|name| self.platform.is_bundle_name(name))
    }

    fn copy_unit(&self, src: &Path, dst: &Path, reporter: &dyn Reporter) -> Result<()> {
        substitute_bundle(src, dst, self.copier, reporter)
    }
}

/// `path` with `suffix` appended to its last component
pub fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Replace the bundle at `dst` with a copy of `src` without ever exposing a
/// half-written bundle under the final name
pub fn substitute_bundle(
    src: &Path,
    dst: &Path,
    copier: &dyn BundleCopier,
    reporter: &dyn Reporter,
) -> Result<()> {
    let staged = sibling(dst, NEW_SUFFIX);
    let old = sibling(dst, OLD_SUFFIX);

    reporter.step(&format!(
        "Atomic bundle replacement: {} -> {}",
        src.display(),
        dst.display()
    ));

    // Leftover from an earlier failed attempt
    remove_if_exists(&staged)?;

    reporter.detail(&format!(
        "Copying bundle with {} to {}",
        copier.name(),
        staged.display()
    ));
    if let Err(e) = copier.copy_bundle(src, &staged) {
        discard(&staged, reporter);
        return Err(e);
    }

    let had_existing = dst.symlink_metadata().is_ok();
    if had_existing {
        remove_if_exists(&old)?;
        reporter.detail(&format!(
            "Backing up existing bundle {} -> {}",
            dst.display(),
            old.display()
        ));
        if let Err(e) = rename(dst, &old) {
            discard(&staged, reporter);
            return Err(e);
        }
    }

    if let Err(e) = rename(&staged, dst) {
        if had_existing {
            if let Err(restore) = rename(&old, dst) {
                reporter.critical(&format!(
                    "Failed to put bundle {} back from {}: {restore}",
                    dst.display(),
                    old.display()
                ));
            }
        }
        discard(&staged, reporter);
        return Err(e);
    }

    if had_existing {
        if let Err(e) = remove_if_exists(&old) {
            reporter.warn(&format!(
                "Failed to remove old bundle {}: {e}",
                old.display()
            ));
        }
    }

    reporter.step(&format!("Replaced bundle {}", dst.display()));
    Ok(())
}

fn discard(path: &Path, reporter: &dyn Reporter) {
    if let Err(e) = remove_if_exists(path) {
        reporter.warn(&format!("Failed to remove {}: {e}", path.display()));
    }
}
