//! Cache directory path management
//!
//! This module provides the `CachePaths` struct which manages all filesystem paths
//! for the cache directory layout:
//!
//! ```text
//! ~/.cache/fastclone/
//! ├── <key>.tar                 # Snapshot of one repository clone
//! ├── <key>.tar.tmp.<pid>.<n>   # Archive being written (renamed into place)
//! └── fastclone.<key>.lock      # flock-based locking
//! ```

use std::path::{Path, PathBuf};

use crate::types::CacheKey;

/// Extension of cached archives.
pub const ARCHIVE_EXT: &str = "tar";

/// Manages all filesystem paths for the cache directory layout
#[derive(Debug, Clone)]
pub struct CachePaths {
    root: PathBuf,
}

impl CachePaths {
    /// Creates a new CachePaths with the specified root directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the root cache directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the archive path for a key: `{root}/{key}.tar`
    pub fn archive_path(&self, key: &CacheKey) -> PathBuf {
        self.root.join(format!("{}.{}", key.as_str(), ARCHIVE_EXT))
    }

    /// Returns the lock file path: `{root}/fastclone.{key}.lock`
    pub fn lock_path(&self, key: &CacheKey) -> PathBuf {
        self.root.join(format!("fastclone.{}.lock", key.as_str()))
    }

    /// Parses the key back out of an archive file name, if it is one.
    pub fn key_from_archive_name(name: &str) -> Option<CacheKey> {
        name.strip_suffix(ARCHIVE_EXT)?
            .strip_suffix('.')?
            .parse()
            .ok()
    }
}

impl Default for CachePaths {
    /// Creates a CachePaths using the system cache directory + "fastclone"
    ///
    /// Uses `dirs::cache_dir()` which resolves to:
    /// - Linux: `~/.cache`
    /// - macOS: `~/Library/Caches`
    /// - Windows: `C:\Users\<user>\AppData\Local`
    fn default() -> Self {
        let cache_dir = dirs::cache_dir().unwrap_or_else(|| PathBuf::from(".cache"));
        Self::new(cache_dir.join("fastclone"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_root_path() -> PathBuf {
        PathBuf::from("cache-root")
    }

    fn test_paths() -> CachePaths {
        CachePaths::new(test_root_path())
    }

    fn test_key() -> CacheKey {
        CacheKey::derive("https://github.com/octocat/Hello-World.git")
    }

    #[test]
    fn test_new() {
        let paths = CachePaths::new("tmp-cache");
        assert_eq!(paths.root(), Path::new("tmp-cache"));
    }

    #[test]
    fn test_default() {
        let paths = CachePaths::default();
        assert!(paths.root().ends_with("fastclone"));
    }

    #[test]
    fn test_archive_path() {
        let paths = test_paths();
        let key = test_key();
        assert_eq!(
            paths.archive_path(&key),
            test_root_path().join(format!("{}.tar", key))
        );
    }

    #[test]
    fn test_lock_path() {
        let paths = test_paths();
        let key = test_key();
        assert_eq!(
            paths.lock_path(&key),
            test_root_path().join(format!("fastclone.{}.lock", key))
        );
    }

    #[test]
    fn test_archive_and_lock_share_key() {
        let paths = test_paths();
        let key = test_key();
        let archive = paths.archive_path(&key);
        let lock = paths.lock_path(&key);
        let archive_name = archive.file_name().unwrap().to_str().unwrap();
        let lock_name = lock.file_name().unwrap().to_str().unwrap();
        assert!(archive_name.starts_with(key.as_str()));
        assert!(lock_name.contains(key.as_str()));
    }

    #[test]
    fn test_key_from_archive_name() {
        let key = test_key();
        let name = format!("{}.tar", key);
        assert_eq!(CachePaths::key_from_archive_name(&name), Some(key.clone()));
        assert_eq!(
            CachePaths::key_from_archive_name(&format!("fastclone.{}.lock", key)),
            None
        );
        assert_eq!(
            CachePaths::key_from_archive_name(&format!("{}.tar.tmp.1.0", key)),
            None
        );
        assert_eq!(CachePaths::key_from_archive_name("notes.tar"), None);
    }
}
