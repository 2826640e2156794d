//! Application type classification result

use std::fmt;

use serde::Serialize;

/// Shape of an application path, as seen by the classifier
///
/// Every consumer (replacement engine, tree strategies, launcher) matches on
/// this exhaustively, so adding a variant is a compile-checked change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationType {
    /// A regular file
    SingleFile,
    /// A bundle directory passed directly (classifiable, never replaceable)
    MacBundle,
    /// A directory holding one or more bundles
    BundleContainerDirectory,
    /// A directory with loose executables
    PlainDirectoryWithExecutables,
    /// A directory without anything launchable
    GenericDirectory,
}

impl ApplicationType {
    /// Whether this type behaves like a single file
    pub fn is_file_like(self) -> bool {
        match self {
            ApplicationType::SingleFile | ApplicationType::MacBundle => true,
            ApplicationType::BundleContainerDirectory
            | ApplicationType::PlainDirectoryWithExecutables
            | ApplicationType::GenericDirectory => false,
        }
    }

    /// Whether `self` can be replaced by `other`
    ///
    /// Both sides must be file-like or both directory-like. Any two
    /// directory-like types are compatible with each other.
    pub fn is_compatible_with(self, other: ApplicationType) -> bool {
        self.is_file_like() == other.is_file_like()
    }
}

impl fmt::Display for ApplicationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ApplicationType::SingleFile => "single file",
            ApplicationType::MacBundle => "macOS app bundle",
            ApplicationType::BundleContainerDirectory => "app bundle directory",
            ApplicationType::PlainDirectoryWithExecutables => "directory with executables",
            ApplicationType::GenericDirectory => "generic directory",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIRECTORY_TYPES: [ApplicationType; 3] = [
        ApplicationType::BundleContainerDirectory,
        ApplicationType::PlainDirectoryWithExecutables,
        ApplicationType::GenericDirectory,
    ];

    #[test]
    fn test_directory_types_are_mutually_compatible() {
        for current in DIRECTORY_TYPES {
            for new in DIRECTORY_TYPES {
                assert!(current.is_compatible_with(new), "{current} -> {new}");
            }
        }
    }

    #[test]
    fn test_file_and_directory_are_incompatible() {
        for dir in DIRECTORY_TYPES {
            assert!(!ApplicationType::SingleFile.is_compatible_with(dir));
            assert!(!dir.is_compatible_with(ApplicationType::SingleFile));
            assert!(!ApplicationType::MacBundle.is_compatible_with(dir));
        }
    }

    #[test]
    fn test_file_like_pair_is_compatible() {
        assert!(ApplicationType::SingleFile.is_compatible_with(ApplicationType::SingleFile));
        assert!(ApplicationType::MacBundle.is_compatible_with(ApplicationType::SingleFile));
    }

    #[test]
    fn test_display() {
        assert_eq!(ApplicationType::SingleFile.to_string(), "single file");
        assert_eq!(
            ApplicationType::BundleContainerDirectory.to_string(),
            "app bundle directory"
        );
    }

    #[test]
    fn test_serialize_snake_case() {
        let json = serde_json::to_string(&ApplicationType::PlainDirectoryWithExecutables).unwrap();
        assert_eq!(json, "\"plain_directory_with_executables\"");
    }
}
