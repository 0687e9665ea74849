//! SHA-256 checksum utilities
//!
//! Provides a single canonical checksum format (`sha256:<hex>`) used for
//! backup integrity verification, plus a deterministic whole-tree digest.

use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

use crate::{Error, Result};

/// Prefix for all checksums produced by this module
const PREFIX: &str = "sha256:";

/// Digest of a directory tree together with the number of files it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeDigest {
    /// Canonical `sha256:<hex>` checksum over the tree
    pub checksum: String,
    /// Number of regular files folded into the checksum
    pub files: u64,
}

/// Compute the SHA-256 checksum of string content.
///
/// Returns a string in the canonical format `"sha256:<hex>"`.
pub fn compute_content_checksum(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{}{:x}", PREFIX, hasher.finalize())
}

/// Compute the SHA-256 checksum of a file's contents.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn compute_file_checksum(path: &Path) -> Result<String> {
    let content = fs::read(path).map_err(|e| Error::io(path, e))?;
    let mut hasher = Sha256::new();
    hasher.update(&content);
    Ok(format!("{}{:x}", PREFIX, hasher.finalize()))
}

/// Compute a deterministic digest over a directory tree.
///
/// Entries are visited in sorted name order, recursing into subdirectories.
/// Each file folds its root-relative path and contents into one running
/// SHA-256. Entries whose file name appears in `exclude` are skipped at any
/// depth; the backup engine uses this to keep its own metadata and integrity
/// records out of the digest they certify.
///
/// Recomputing over an unmodified tree always reproduces the same value; any
/// difference signals corruption.
pub fn hash_tree(root: &Path, exclude: &[&str]) -> Result<TreeDigest> {
    let mut hasher = Sha256::new();
    let mut files = 0u64;
    hash_dir(root, root, exclude, &mut hasher, &mut files)?;
    Ok(TreeDigest {
        checksum: format!("{}{:x}", PREFIX, hasher.finalize()),
        files,
    })
}

fn hash_dir(
    dir: &Path,
    root: &Path,
    exclude: &[&str],
    hasher: &mut Sha256,
    files: &mut u64,
) -> Result<()> {
    let mut entries: Vec<_> = fs::read_dir(dir)
        .map_err(|e| Error::io(dir, e))?
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(|e| Error::io(dir, e))?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let name = entry.file_name();
        let name_str = name.to_string_lossy();
        if exclude.contains(&name_str.as_ref()) {
            continue;
        }

        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| Error::io(&path, e))?;
        if file_type.is_dir() {
            hash_dir(&path, root, exclude, hasher, files)?;
        } else if file_type.is_file() {
            // Fold the relative path so moves and renames change the digest
            let relative = path.strip_prefix(root).unwrap_or(&path);
            hasher.update(relative.to_string_lossy().as_bytes());
            hasher.update([0u8]);
            let content = fs::read(&path).map_err(|e| Error::io(&path, e))?;
            hasher.update(&content);
            *files += 1;
        }
        // Symlinks and other entry kinds are not part of backup contents
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn content_checksum_has_prefix() {
        let checksum = compute_content_checksum("hello world");
        assert!(checksum.starts_with("sha256:"));
    }

    #[test]
    fn content_checksum_known_value() {
        let checksum = compute_content_checksum("hello world");
        assert_eq!(
            checksum,
            "sha256:b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn file_checksum_matches_content_checksum() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.txt");
        fs::write(&path, "hello world").unwrap();

        let file_cs = compute_file_checksum(&path).unwrap();
        let content_cs = compute_content_checksum("hello world");
        assert_eq!(file_cs, content_cs);
    }

    #[test]
    fn hash_tree_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("a.txt"), "alpha").unwrap();
        fs::write(dir.path().join("sub/b.txt"), "beta").unwrap();

        let first = hash_tree(dir.path(), &[]).unwrap();
        let second = hash_tree(dir.path(), &[]).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.files, 2);
    }

    #[test]
    fn hash_tree_detects_content_change() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "alpha").unwrap();

        let before = hash_tree(dir.path(), &[]).unwrap();
        fs::write(dir.path().join("a.txt"), "alphb").unwrap();
        let after = hash_tree(dir.path(), &[]).unwrap();

        assert_ne!(before.checksum, after.checksum);
        assert_eq!(before.files, after.files);
    }

    #[test]
    fn hash_tree_detects_rename() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "alpha").unwrap();
        let before = hash_tree(dir.path(), &[]).unwrap();

        fs::rename(dir.path().join("a.txt"), dir.path().join("b.txt")).unwrap();
        let after = hash_tree(dir.path(), &[]).unwrap();

        assert_ne!(before.checksum, after.checksum);
    }

    #[test]
    fn hash_tree_excludes_named_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "alpha").unwrap();
        let before = hash_tree(dir.path(), &["metadata.json"]).unwrap();

        fs::write(dir.path().join("metadata.json"), "{}").unwrap();
        let after = hash_tree(dir.path(), &["metadata.json"]).unwrap();

        assert_eq!(before, after);
    }

    #[test]
    fn hash_tree_empty_dir_has_zero_files() {
        let dir = tempfile::tempdir().unwrap();
        let digest = hash_tree(dir.path(), &[]).unwrap();
        assert_eq!(digest.files, 0);
    }
}
