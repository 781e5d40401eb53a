//! The cache store: one archive per key in a single directory.

use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Serialize;

use super::lock::KeyLock;
use super::paths::CachePaths;
use super::staleness::{self, DEFAULT_MAX_AGE};
use crate::types::CacheKey;

/// A cached archive as found on disk.
#[derive(Debug, Clone, Serialize)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub archive_path: PathBuf,
    pub size_bytes: u64,
    /// Seconds since the Unix epoch.
    pub last_modified: u64,
    pub age_secs: u64,
    pub fresh: bool,
}

/// Cache directory plus its freshness policy.
#[derive(Debug, Clone)]
pub struct CacheStore {
    paths: CachePaths,
    max_age: Duration,
}

impl CacheStore {
    /// Create a store rooted at the provided cache paths.
    pub fn new(paths: CachePaths) -> Self {
        Self {
            paths,
            max_age: DEFAULT_MAX_AGE,
        }
    }

    /// Set the maximum age for cached archives before rebuild.
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn paths(&self) -> &CachePaths {
        &self.paths
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Create the cache root. An existing directory is fine.
    pub fn ensure_root(&self) -> io::Result<()> {
        std::fs::create_dir_all(self.paths.root())
    }

    pub fn archive_path(&self, key: &CacheKey) -> PathBuf {
        self.paths.archive_path(key)
    }

    /// Whether the archive for `key` exists and is younger than the window.
    pub fn is_fresh(&self, key: &CacheKey) -> bool {
        staleness::is_fresh(&self.paths.archive_path(key), self.max_age)
    }

    /// [`is_fresh`](Self::is_fresh) evaluated while holding the key's lock.
    pub fn is_fresh_locked(&self, key: &CacheKey) -> io::Result<bool> {
        let _lock = self.lock(key)?;
        Ok(self.is_fresh(key))
    }

    /// Block until the lock for `key` is held.
    pub fn lock(&self, key: &CacheKey) -> io::Result<KeyLock> {
        let lock_path = self.paths.lock_path(key);
        log::debug!("acquiring lock {}", lock_path.display());
        KeyLock::acquire(&lock_path)
    }

    /// List cached archives, sorted by key. A missing root is an empty cache.
    pub fn entries(&self) -> io::Result<Vec<CacheEntry>> {
        let now = SystemTime::now();
        let read_dir = match std::fs::read_dir(self.paths.root()) {
            Ok(rd) => rd,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut entries = Vec::new();
        for dir_entry in read_dir.flatten() {
            let Some(key) = dir_entry
                .file_name()
                .to_str()
                .and_then(CachePaths::key_from_archive_name)
            else {
                continue;
            };
            let Ok(meta) = dir_entry.metadata() else {
                continue;
            };
            if !meta.is_file() {
                continue;
            }
            let modified = meta.modified().unwrap_or(UNIX_EPOCH);
            let path = dir_entry.path();
            entries.push(CacheEntry {
                key,
                fresh: staleness::is_fresh_at(&path, self.max_age, now),
                archive_path: path,
                size_bytes: meta.len(),
                last_modified: unix_secs(modified),
                age_secs: staleness::age_at(modified, now).as_secs(),
            });
        }

        entries.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(entries)
    }

    /// Root directory shortcut.
    pub fn root(&self) -> &Path {
        self.paths.root()
    }
}

fn unix_secs(t: SystemTime) -> u64 {
    t.duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}
