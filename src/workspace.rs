//! Restoring a working copy from a cached archive.

use std::path::{Path, PathBuf};

use crate::error::CloneError;
use crate::platform::Platform;
use crate::process::{CommandRunner, Invocation};

/// Validate that a git ref (branch name or commit SHA) does not contain dangerous patterns.
///
/// Rejects:
/// - Empty strings
/// - Strings containing `..` (path traversal)
/// - Strings starting with `-` (could be interpreted as flags)
/// - Strings containing null bytes or control characters
pub fn validate_git_ref(value: &str, name: &str) -> Result<(), CloneError> {
    if value.is_empty() {
        return Err(CloneError::InvalidInput(format!("{} cannot be empty", name)));
    }
    if value.contains("..") {
        return Err(CloneError::InvalidInput(format!(
            "{} cannot contain '..'",
            name
        )));
    }
    if value.starts_with('-') {
        return Err(CloneError::InvalidInput(format!(
            "{} cannot start with '-'",
            name
        )));
    }
    if value.bytes().any(|b| b < 0x20 || b == 0x7f) {
        return Err(CloneError::InvalidInput(format!(
            "{} cannot contain null or control characters",
            name
        )));
    }
    Ok(())
}

/// Create the target directory if needed and return its absolute path.
pub fn ensure_target(target: &Path) -> Result<PathBuf, CloneError> {
    std::fs::create_dir_all(target)?;
    Ok(std::path::absolute(target)?)
}

pub struct Materializer<'a> {
    runner: &'a dyn CommandRunner,
    platform: Platform,
}

impl<'a> Materializer<'a> {
    pub fn new(runner: &'a dyn CommandRunner, platform: Platform) -> Self {
        Self { runner, platform }
    }

    /// Unpack `archive` into `target`, dropping the archive's top-level directory.
    pub fn extract(&self, archive: &Path, target: &Path) -> Result<(), CloneError> {
        let archive_arg = self.platform.tool_path(archive, target)?;
        let target_arg = self.platform.tool_path(target, target)?;
        self.runner.run(
            &Invocation::new("tar")
                .arg("xf")
                .arg(archive_arg)
                .arg("-C")
                .arg(target_arg)
                .args(["--strip-components", "1"])
                .current_dir(target),
        )?;
        log::info!("extracted {} into {}", archive.display(), target.display());
        Ok(())
    }

    /// Bring the working copy at `target` up to date with its remote.
    ///
    /// Without a branch the current branch is pulled. With one, remote refs are
    /// fetched first so branches that only exist upstream can be checked out.
    /// `branch` is passed to git as-is; check it with [`validate_git_ref`] first.
    pub fn update(&self, target: &Path, branch: Option<&str>) -> Result<(), CloneError> {
        match branch {
            None => {
                self.git(target, &["pull", "-q"])?;
            }
            Some(branch) => {
                self.git(target, &["fetch", "-q"])?;
                self.git(target, &["checkout", "-q", branch])?;
            }
        }
        Ok(())
    }

    fn git(&self, target: &Path, args: &[&str]) -> Result<(), CloneError> {
        self.runner.run(
            &Invocation::new("git")
                .arg("-C")
                .arg(target)
                .args(args.iter().copied()),
        )?;
        Ok(())
    }
}
