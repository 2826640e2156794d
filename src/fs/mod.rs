//! Tree move/copy primitives used by the replacement engine
//!
//! Two strategies share one contract, [`TreeOps`]:
//! - [`PlainTree`] recurses into every directory
//! - [`BundleTree`] stops at bundle directories and handles each one as a
//!   single unit (renamed whole, copied through a [`BundleCopier`])
//!
//! None of the walks is transactional. A failure leaves a partially moved or
//! partially copied tree and the error bubbles up, the engine owns rollback.

pub mod bundle;
pub mod copier;
pub mod plain;

use std::ffi::OsStr;
use std::fs::{self, DirEntry, File, FileType};
use std::io;
use std::path::Path;

use crate::domain::{ApplicationType, Platform};
use crate::error::Result;
use crate::error::fs::{io_error, read_failed, write_failed};
use crate::ui::Reporter;

pub use bundle::BundleTree;
pub use copier::{BundleCopier, DittoCopier, RecursiveCopier, default_copier};
pub use plain::PlainTree;

/// Recursive move/copy contract shared by the plain and bundle-aware walks
pub trait TreeOps {
    /// Short label used in progress messages
    fn name(&self) -> &'static str;

    /// Whether a directory entry must be handled as one opaque unit
    fn is_atomic_unit(&self, path: &Path, file_type: &FileType) -> bool;

    /// Copy one atomic unit from `src` to `dst`
    fn copy_unit(&self, src: &Path, dst: &Path, reporter: &dyn Reporter) -> Result<()>;

    /// Move the contents of `src` into `dst`, one entry at a time
    ///
    /// Directories are recreated in `dst` with the permissions of their
    /// source and emptied recursively, then the empty source is removed.
    /// Files, symlinks and atomic units are renamed. An entry named `skip`
    /// directly inside `src` is left alone.
    fn move_tree(
        &self,
        src: &Path,
        dst: &Path,
        skip: Option<&OsStr>,
        reporter: &dyn Reporter,
    ) -> Result<()> {
        for entry in list_dir(src)? {
            let name = entry.file_name();
            if skip.is_some_and(|s| s == name.as_os_str()) {
                continue;
            }

            let from = entry.path();
            let to = dst.join(&name);
            let file_type = entry.file_type().map_err(|e| read_failed(&from, &e))?;

            if file_type.is_dir() && !self.is_atomic_unit(&from, &file_type) {
                ensure_dir(&to)?;
                self.move_tree(&from, &to, None, reporter)?;
                copy_permissions(&from, &to)?;
                fs::remove_dir(&from).map_err(|e| write_failed(&from, &e))?;
            } else {
                if file_type.is_dir() {
                    reporter.detail(&format!(
                        "Moving bundle {} -> {}",
                        from.display(),
                        to.display()
                    ));
                }
                rename(&from, &to)?;
            }
        }

        Ok(())
    }

    /// Copy the contents of `src` into `dst`
    ///
    /// Every file is flushed to disk before the next one starts.
    fn copy_tree(&self, src: &Path, dst: &Path, reporter: &dyn Reporter) -> Result<()> {
        ensure_dir(dst)?;

        for entry in list_dir(src)? {
            let from = entry.path();
            let to = dst.join(entry.file_name());
            let file_type = entry.file_type().map_err(|e| read_failed(&from, &e))?;

            if file_type.is_dir() {
                if self.is_atomic_unit(&from, &file_type) {
                    self.copy_unit(&from, &to, reporter)?;
                } else {
                    self.copy_tree(&from, &to, reporter)?;
                    copy_permissions(&from, &to)?;
                }
            } else if file_type.is_symlink() {
                copy_symlink(&from, &to)?;
            } else {
                reporter.detail(&format!("Copying {}", from.display()));
                copy_file(&from, &to)?;
            }
        }

        Ok(())
    }

    /// Move everything in `backup` back into `dst`
    fn restore_tree(&self, backup: &Path, dst: &Path, reporter: &dyn Reporter) -> Result<()> {
        self.move_tree(backup, dst, None, reporter)
    }
}

/// Pick the walk for a classified target directory
///
/// Only a bundle container switches to the bundle-aware walk. The choice is
/// made once per replacement and used for backup, copy and restore alike.
pub fn strategy_for<'a>(
    current: ApplicationType,
    platform: Platform,
    copier: &'a dyn BundleCopier,
) -> Box<dyn TreeOps + 'a> {
    match current {
        ApplicationType::BundleContainerDirectory => Box::new(BundleTree::new(platform, copier)),
        ApplicationType::SingleFile
        | ApplicationType::MacBundle
        | ApplicationType::PlainDirectoryWithExecutables
        | ApplicationType::GenericDirectory => Box::new(PlainTree),
    }
}

/// Directory entries of `dir`, read up front so the walk can move them
pub fn list_dir(dir: &Path) -> Result<Vec<DirEntry>> {
    fs::read_dir(dir)
        .and_then(|entries| entries.collect::<io::Result<Vec<_>>>())
        .map_err(|e| read_failed(dir, &e))
}

/// Create `dir` unless it already exists as a directory
pub fn ensure_dir(dir: &Path) -> Result<()> {
    match fs::create_dir(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && dir.is_dir() => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(dir).map_err(|e| write_failed(dir, &e))
        }
        Err(e) => Err(write_failed(dir, &e)),
    }
}

/// Give `dst` the permission bits of `src`
pub fn copy_permissions(src: &Path, dst: &Path) -> Result<()> {
    let permissions = fs::metadata(src)
        .map_err(|e| read_failed(src, &e))?
        .permissions();
    fs::set_permissions(dst, permissions).map_err(|e| write_failed(dst, &e))
}

/// Rename `from` to `to`
pub fn rename(from: &Path, to: &Path) -> Result<()> {
    fs::rename(from, to).map_err(|e| {
        io_error(format!(
            "failed to move {} to {}: {e}",
            from.display(),
            to.display()
        ))
    })
}

/// Copy one regular file, sync it, and carry its permission bits over
pub fn copy_file(src: &Path, dst: &Path) -> Result<()> {
    let mut reader = File::open(src).map_err(|e| read_failed(src, &e))?;
    let permissions = reader
        .metadata()
        .map_err(|e| read_failed(src, &e))?
        .permissions();

    let mut writer = File::create(dst).map_err(|e| write_failed(dst, &e))?;
    io::copy(&mut reader, &mut writer).map_err(|e| write_failed(dst, &e))?;
    writer.sync_all().map_err(|e| write_failed(dst, &e))?;
    drop(writer);

    fs::set_permissions(dst, permissions).map_err(|e| write_failed(dst, &e))
}

/// Recreate a symlink at `dst` pointing where `src` points
#[cfg(unix)]
pub fn copy_symlink(src: &Path, dst: &Path) -> Result<()> {
    let target = fs::read_link(src).map_err(|e| read_failed(src, &e))?;
    std::os::unix::fs::symlink(&target, dst).map_err(|e| write_failed(dst, &e))
}

/// Copy what a symlink points to (links are not portable here)
#[cfg(not(unix))]
pub fn copy_symlink(src: &Path, dst: &Path) -> Result<()> {
    if src.is_dir() {
        return Err(io_error(format!(
            "cannot copy directory symlink {}",
            src.display()
        )));
    }
    copy_file(src, dst)
}

/// Remove a file, symlink or whole directory tree
pub fn remove_path(path: &Path) -> Result<()> {
    let metadata = fs::symlink_metadata(path).map_err(|e| read_failed(path, &e))?;
    let result = if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    result.map_err(|e| write_failed(path, &e))
}

/// Remove `path` if it exists
pub fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::symlink_metadata(path) {
        Ok(_) => remove_path(path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(read_failed(path, &e)),
    }
}
