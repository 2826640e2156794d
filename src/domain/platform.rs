//! Host platform conventions
//!
//! Bundle naming, executable recognition and search locations differ per
//! operating system. Everything that classifies or launches takes a
//! [`Platform`] value instead of checking `cfg!` itself.

use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Suffix of a macOS application bundle directory
pub const BUNDLE_SUFFIX: &str = ".app";

/// File extensions treated as executable on Windows
const WINDOWS_EXECUTABLE_EXTENSIONS: &[&str] = &["exe", "com", "bat", "cmd"];

/// Operating system family the updater runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    MacOs,
    Windows,
    Linux,
}

impl Platform {
    /// Platform of the running process
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Platform::MacOs
        } else if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Linux
        }
    }

    /// Directory suffix that marks an atomic bundle, if the platform has bundles
    pub fn bundle_suffix(self) -> Option<&'static str> {
        match self {
            Platform::MacOs => Some(BUNDLE_SUFFIX),
            Platform::Windows | Platform::Linux => None,
        }
    }

    /// Whether an entry name carries the bundle suffix
    pub fn is_bundle_name(self, name: &OsStr) -> bool {
        match (self.bundle_suffix(), name.to_str()) {
            (Some(suffix), Some(name)) => name.ends_with(suffix),
            _ => false,
        }
    }

    /// Whether `path` is a bundle directory on this platform
    pub fn is_bundle_dir(self, path: &Path) -> bool {
        path.file_name().is_some_and(|name| self.is_bundle_name(name)) && path.is_dir()
    }

    /// Extensions (lowercase, without dot) that make a file executable
    ///
    /// Empty on POSIX platforms, where the permission bits decide.
    pub fn executable_extensions(self) -> &'static [&'static str] {
        match self {
            Platform::Windows => WINDOWS_EXECUTABLE_EXTENSIONS,
            Platform::MacOs | Platform::Linux => &[],
        }
    }

    /// Whether executability is decided by Unix permission bits
    pub fn uses_permission_bits(self) -> bool {
        matches!(self, Platform::MacOs | Platform::Linux)
    }

    /// Directories probed for executables, in priority order
    pub fn executable_search_dirs(self, root: &Path) -> Vec<PathBuf> {
        match self {
            Platform::Linux => vec![
                root.join("bin"),
                root.join("usr").join("bin"),
                root.to_path_buf(),
            ],
            Platform::MacOs | Platform::Windows => vec![root.to_path_buf()],
        }
    }

    /// Lowercased file name with a recognised executable extension removed
    pub fn normalize_executable_name(self, name: &str) -> String {
        let lower = name.to_lowercase();
        if let Some((stem, ext)) = lower.rsplit_once('.') {
            if !stem.is_empty() && self.executable_extensions().contains(&ext) {
                return stem.to_string();
            }
        }
        lower
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::MacOs => write!(f, "macOS"),
            Platform::Windows => write!(f, "Windows"),
            Platform::Linux => write!(f, "Linux"),
        }
    }
}
