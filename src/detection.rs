//! Application type detection
//!
//! Classifies a path purely from its shape and a look at its immediate
//! children. Nothing is cached: every call inspects the filesystem again.

use std::fs;
use std::path::Path;

use crate::domain::{ApplicationType, Platform};
use crate::error::Result;
use crate::error::fs::stat_failed;
use crate::locator;

/// Classify `path` for `platform`
///
/// Order of checks:
/// 1. not a directory: [`ApplicationType::SingleFile`]
/// 2. bundle-suffixed directory: [`ApplicationType::MacBundle`]
/// 3. any child bundle: [`ApplicationType::BundleContainerDirectory`]
/// 4. any executable in the search dirs: [`ApplicationType::PlainDirectoryWithExecutables`]
/// 5. otherwise [`ApplicationType::GenericDirectory`]
pub fn classify(path: &Path, platform: Platform) -> Result<ApplicationType> {
    let metadata = fs::metadata(path).map_err(|e| stat_failed(path, &e))?;

    if !metadata.is_dir() {
        return Ok(ApplicationType::SingleFile);
    }

    if path
        .file_name()
        .is_some_and(|name| platform.is_bundle_name(name))
    {
        return Ok(ApplicationType::MacBundle);
    }

    if contains_bundles(path, platform)? {
        return Ok(ApplicationType::BundleContainerDirectory);
    }

    let has_executables = platform
        .executable_search_dirs(path)
        .iter()
        .filter(|dir| dir.is_dir())
        .any(|dir| !locator::find_executables(dir, platform).is_empty());

    if has_executables {
        Ok(ApplicationType::PlainDirectoryWithExecutables)
    } else {
        Ok(ApplicationType::GenericDirectory)
    }
}

/// Whether any immediate child of `dir` is a bundle directory
pub fn contains_bundles(dir: &Path, platform: Platform) -> Result<bool> {
    if platform.bundle_suffix().is_none() {
        return Ok(false);
    }

    let entries = fs::read_dir(dir).map_err(|e| stat_failed(dir, &e))?;
    Ok(entries
        .flatten()
        .any(|entry| platform.is_bundle_name(&entry.file_name()) && entry.path().is_dir()))
}
