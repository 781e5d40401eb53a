//! Building a cache archive: clone into scratch space, verify, archive.
//!
//! Runs inside the population lock for the key. The scratch directory is a
//! `tempfile::TempDir`, so it is removed on every exit path; only the
//! teardown error the platform policy tolerates is swallowed.

use std::io;
use std::path::Path;

use tempfile::TempDir;

use crate::cache::{atomic_replace, remove_stale_temps, temp_sibling};
use crate::error::CloneError;
use crate::platform::Platform;
use crate::process::{CommandRunner, Invocation};

/// Fixed name of the clone inside the scratch directory, and the single
/// top-level entry of every archive.
pub const CLONE_DIR: &str = "FOO";

/// `git status` phrasings for a clean tree, newer and older clients.
const CLEAN_MARKERS: [&str; 2] = [
    "nothing to commit, working tree clean",
    "nothing to commit, working directory clean",
];

/// Whether `git status` output reports a clean working tree.
pub fn is_clean_status(stdout: &str) -> bool {
    CLEAN_MARKERS.iter().any(|marker| stdout.contains(marker))
}

pub struct SnapshotBuilder<'a> {
    runner: &'a dyn CommandRunner,
    platform: Platform,
}

impl<'a> SnapshotBuilder<'a> {
    pub fn new(runner: &'a dyn CommandRunner, platform: Platform) -> Self {
        Self { runner, platform }
    }

    /// Clone `url` and replace `archive` with a tarball of the clone.
    ///
    /// On failure the previous archive, if any, is left untouched.
    pub fn build(&self, url: &str, archive: &Path) -> Result<(), CloneError> {
        let scratch = tempfile::Builder::new().suffix(".fastclone").tempdir()?;
        log::debug!("scratch directory {}", scratch.path().display());

        let mut result = self.snapshot(url, scratch.path(), archive);

        if self.platform.clears_readonly() && scratch.path().join(CLONE_DIR).exists() {
            if let Err(e) = self.clear_readonly(scratch.path()) {
                if result.is_ok() {
                    result = Err(e);
                } else {
                    log::warn!("clearing read-only attributes failed: {}", e);
                }
            }
        }

        let teardown = self.teardown(scratch);
        match (result, teardown) {
            (Err(e), Err(cleanup)) => {
                log::warn!("scratch cleanup also failed: {}", cleanup);
                Err(e)
            }
            (Err(e), Ok(())) => Err(e),
            (Ok(()), teardown) => teardown,
        }
    }

    fn snapshot(&self, url: &str, scratch: &Path, archive: &Path) -> Result<(), CloneError> {
        self.runner.run(
            &Invocation::new("git")
                .args(["clone", "-q", "--"])
                .arg(url)
                .arg(CLONE_DIR)
                .current_dir(scratch),
        )?;

        let status = self.runner.run(
            &Invocation::new("git")
                .args(["-C", CLONE_DIR, "status"])
                .current_dir(scratch),
        )?;
        if !is_clean_status(&status.stdout) {
            return Err(CloneError::DirtyClone {
                url: url.to_string(),
            });
        }

        let removed = remove_stale_temps(archive)?;
        if removed > 0 {
            log::warn!(
                "removed {} abandoned temp archive(s) for {}",
                removed,
                archive.display()
            );
        }

        let temp = temp_sibling(archive);
        let temp_arg = self.platform.tool_path(&temp, scratch)?;
        let archived = self.runner.run(
            &Invocation::new("tar")
                .arg("cf")
                .arg(temp_arg)
                .arg(CLONE_DIR)
                .current_dir(scratch),
        );
        if let Err(e) = archived {
            let _ = std::fs::remove_file(&temp);
            return Err(e.into());
        }

        atomic_replace(&temp, archive)?;
        log::info!("cached {} as {}", url, archive.display());
        Ok(())
    }

    fn clear_readonly(&self, scratch: &Path) -> Result<(), CloneError> {
        self.runner.run(
            &Invocation::new("attrib")
                .arg("-R")
                .arg(format!("{}/*", CLONE_DIR))
                .arg("/S")
                .current_dir(scratch),
        )?;
        Ok(())
    }

    fn teardown(&self, scratch: TempDir) -> Result<(), CloneError> {
        resolve_teardown(self.platform, scratch.close())
    }
}

/// Decide whether a scratch removal failure is fatal on `platform`.
fn resolve_teardown(platform: Platform, teardown: io::Result<()>) -> Result<(), CloneError> {
    match teardown {
        Ok(()) => Ok(()),
        Err(e) if platform.tolerates_cleanup_error(&e) => {
            log::warn!("ignoring scratch cleanup failure: {}", e);
            Ok(())
        }
        Err(e) => Err(CloneError::ScratchCleanup(e)),
    }
}
