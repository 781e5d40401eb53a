//! Fetch-or-reuse: the public clone operation.
//!
//! Three separate critical sections on the key's lock, in order:
//! 1. freshness check
//! 2. population (re-checks freshness, then clone + archive)
//! 3. extraction into the target
//!
//! The post-extraction update runs with no lock held. Another process may
//! rebuild the archive between sections 1 and 3; extraction then reads
//! whichever complete archive is current.

use std::path::Path;
use std::sync::Arc;

use crate::cache::{CachePaths, CacheStore};
use crate::error::CloneError;
use crate::platform::Platform;
use crate::process::{CommandRunner, SystemRunner};
use crate::snapshot::SnapshotBuilder;
use crate::types::{CacheKey, RepoRef};
use crate::workspace::{self, Materializer, validate_git_ref};

/// How the archive used for a clone was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloneOutcome {
    /// A fresh archive was already cached.
    Hit,
    /// This call cloned the repository and wrote the archive.
    Populated,
}

/// Clones repositories through the archive cache.
#[derive(Clone)]
pub struct FastClone {
    store: CacheStore,
    runner: Arc<dyn CommandRunner>,
    platform: Platform,
}

impl FastClone {
    /// Use the system git and tar for the current platform.
    pub fn new(store: CacheStore) -> Self {
        Self {
            store,
            runner: Arc::new(SystemRunner::new()),
            platform: Platform::current(),
        }
    }

    pub fn with_runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Materialize `repo` at `target`, reusing the cached archive when fresh.
    pub fn clone_into(&self, repo: &RepoRef, target: &Path) -> Result<CloneOutcome, CloneError> {
        if let Some(branch) = &repo.branch {
            validate_git_ref(branch, "branch")?;
        }

        let key = repo.key();
        let archive = self.store.archive_path(&key);
        self.store.ensure_root()?;

        let fresh = self.store.is_fresh_locked(&key)?;

        let outcome = if fresh {
            log::debug!("cache hit for {} ({})", repo.url, key);
            CloneOutcome::Hit
        } else {
            self.populate(&key, &repo.url, &archive)?
        };

        let target = workspace::ensure_target(target)?;
        let materializer = Materializer::new(self.runner.as_ref(), self.platform);
        {
            let _lock = self.store.lock(&key)?;
            materializer.extract(&archive, &target)?;
        }

        materializer.update(&target, repo.branch.as_deref())?;
        Ok(outcome)
    }

    fn populate(
        &self,
        key: &CacheKey,
        url: &str,
        archive: &Path,
    ) -> Result<CloneOutcome, CloneError> {
        let _lock = self.store.lock(key)?;

        // Re-check under lock (another process may have just rebuilt it)
        if self.store.is_fresh(key) {
            log::debug!("cache for {} populated while waiting for lock", url);
            return Ok(CloneOutcome::Hit);
        }

        log::info!("populating cache for {} ({})", url, key);
        SnapshotBuilder::new(self.runner.as_ref(), self.platform).build(url, archive)?;
        Ok(CloneOutcome::Populated)
    }
}

impl Default for FastClone {
    fn default() -> Self {
        Self::new(CacheStore::new(CachePaths::default()))
    }
}

/// Clone `url` into `target` using the default cache location.
///
/// When `branch` is given it is checked out after the cached copy is
/// restored; otherwise the default branch is pulled.
pub fn fastclone(
    url: &str,
    target: impl AsRef<Path>,
    branch: Option<&str>,
) -> Result<(), CloneError> {
    let mut repo = RepoRef::new(url);
    if let Some(branch) = branch {
        repo = repo.with_branch(branch);
    }
    FastClone::default().clone_into(&repo, target.as_ref())?;
    Ok(())
}
