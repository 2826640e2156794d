//! BLAKE3 checksums of staged update content

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use blake3::Hasher;
use walkdir::WalkDir;

use crate::error::fs::{io_error, read_failed};
use crate::error::validation::not_found;
use crate::error::{Result, UpdaterError};
use crate::transaction::is_backup_name;

/// Prefix of every checksum this module produces
pub const HASH_PREFIX: &str = "blake3:";

/// Checksum of a single file
pub fn hash_file(path: &Path) -> Result<String> {
    let mut hasher = Hasher::new();
    feed_file(&mut hasher, path)?;
    Ok(format!("{HASH_PREFIX}{}", hasher.finalize().to_hex()))
}

/// Checksum of a directory tree
///
/// Covers every regular file below `path`: its path relative to `path`
/// (with `/` separators) and its bytes, in sorted path order. Leftover
/// backup directories are not part of the content and are skipped.
pub fn hash_directory(path: &Path) -> Result<String> {
    if !path.is_dir() {
        return Err(not_found(path));
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(path)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_backup_name(e.file_name()));

    for entry in walker {
        let entry =
            entry.map_err(|e| io_error(format!("failed to walk {}: {e}", path.display())))?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    files.sort();

    let mut hasher = Hasher::new();
    for file in &files {
        let relative = file.strip_prefix(path).unwrap_or(file);
        let relative: Vec<_> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect();

        hasher.update(relative.join("/").as_bytes());
        hasher.update(b"\0");
        feed_file(&mut hasher, file)?;
        hasher.update(b"\0");
    }

    Ok(format!("{HASH_PREFIX}{}", hasher.finalize().to_hex()))
}

/// Whether two checksums are equal, with or without prefix, ignoring case
pub fn verify_hash(expected: &str, actual: &str) -> bool {
    let normalize = |h: &str| {
        let h = h.trim();
        h.strip_prefix(HASH_PREFIX).unwrap_or(h).to_ascii_lowercase()
    };

    normalize(expected) == normalize(actual)
}

/// Check `path` (file or directory) against `expected`
///
/// Returns the actual checksum when it matches.
pub fn verify_path(path: &Path, expected: &str) -> Result<String> {
    let actual = if path.is_dir() {
        hash_directory(path)?
    } else {
        hash_file(path)?
    };

    if verify_hash(expected, &actual) {
        Ok(actual)
    } else {
        Err(UpdaterError::ChecksumMismatch {
            path: path.display().to_string(),
            expected: expected.to_string(),
            actual,
        })
    }
}

fn feed_file(hasher: &mut Hasher, path: &Path) -> Result<()> {
    let file = File::open(path).map_err(|e| read_failed(path, &e))?;
    hasher
        .update_reader(BufReader::new(file))
        .map_err(|e| read_failed(path, &e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_hash_file() {
        let temp = TempDir::new().unwrap();
        let file_path = temp.path().join("test.txt");
        fs::write(&file_path, "test content").unwrap();

        let hash = hash_file(&file_path).unwrap();
        assert!(hash.starts_with(HASH_PREFIX));
        assert_eq!(
            hash,
            format!("{HASH_PREFIX}{}", blake3::hash(b"test content").to_hex())
        );
    }

    #[test]
    fn test_hash_file_not_found() {
        let result = hash_file(Path::new("/nonexistent/file.txt"));
        assert!(matches!(result, Err(UpdaterError::FileReadFailed { .. })));
    }

    #[test]
    fn test_hash_directory_deterministic() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), "aaa").unwrap();
        fs::create_dir(temp.path().join("sub")).unwrap();
        fs::write(temp.path().join("sub/b.txt"), "bbb").unwrap();

        let hash1 = hash_directory(temp.path()).unwrap();
        let hash2 = hash_directory(temp.path()).unwrap();
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_hash_directory_sees_renames() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), "same").unwrap();
        let before = hash_directory(temp.path()).unwrap();

        fs::rename(temp.path().join("a.txt"), temp.path().join("b.txt")).unwrap();
        let after = hash_directory(temp.path()).unwrap();

        assert_ne!(before, after);
    }

    #[test]
    fn test_hash_directory_skips_backup_dirs() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("file.txt"), "content").unwrap();
        let hash1 = hash_directory(temp.path()).unwrap();

        let backup = temp.path().join(".backup.18c2d4");
        fs::create_dir(&backup).unwrap();
        fs::write(backup.join("file.txt"), "old content").unwrap();
        let hash2 = hash_directory(temp.path()).unwrap();

        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_hash_directory_requires_directory() {
        let temp = TempDir::new().unwrap();
        let result = hash_directory(&temp.path().join("missing"));
        assert!(matches!(result, Err(UpdaterError::PathNotFound { .. })));
    }

    #[test]
    fn test_verify_hash() {
        let hash1 = format!("{HASH_PREFIX}abc123");
        assert!(verify_hash(&hash1, &hash1));

        // Prefix and case are not significant
        assert!(verify_hash(&hash1, "ABC123"));

        let hash3 = format!("{HASH_PREFIX}def456");
        assert!(!verify_hash(&hash1, &hash3));
    }

    #[test]
    fn test_verify_path() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("app.bin"), "binary").unwrap();
        let expected = hash_directory(temp.path()).unwrap();

        assert_eq!(verify_path(temp.path(), &expected).unwrap(), expected);

        let err = verify_path(temp.path(), "blake3:0000").unwrap_err();
        assert!(matches!(err, UpdaterError::ChecksumMismatch { .. }));
    }
}
