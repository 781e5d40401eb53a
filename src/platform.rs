//! Platform-specific behavior, selected once and passed down.
//!
//! Windows differs in two ways:
//! - tar is handed relative, forward-slash paths (`C:\...` reads as a remote host)
//! - clones leave read-only files that break scratch directory removal

use std::ffi::OsString;
use std::io;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Posix,
    Windows,
}

impl Platform {
    /// The platform this binary was built for.
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Posix
        }
    }

    /// Express `path` as an argument for a tool running in `cwd`.
    ///
    /// On Windows this fails when `path` and `cwd` are on different drives,
    /// since no relative form exists and the absolute one is misread by tar.
    pub fn tool_path(self, path: &Path, cwd: &Path) -> io::Result<OsString> {
        match self {
            Platform::Posix => Ok(path.as_os_str().to_os_string()),
            Platform::Windows => relative_arg(&absolutize(path), &absolutize(cwd)),
        }
    }

    /// Whether read-only attributes must be cleared before removing a clone.
    pub fn clears_readonly(self) -> bool {
        self == Platform::Windows
    }

    /// Whether a scratch teardown failure can be ignored.
    pub fn tolerates_cleanup_error(self, err: &io::Error) -> bool {
        self == Platform::Windows && err.kind() == io::ErrorKind::PermissionDenied
    }
}

fn absolutize(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

fn relative_arg(path: &Path, cwd: &Path) -> io::Result<OsString> {
    let rel = relative_to(path, cwd).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "no relative path from {} to {}",
                cwd.display(),
                path.display()
            ),
        )
    })?;
    Ok(OsString::from(to_forward_slashes(&rel)))
}

/// Relative path from `base` to `path`. None when they share no root.
fn relative_to(path: &Path, base: &Path) -> Option<PathBuf> {
    let path: Vec<Component> = path.components().collect();
    let base: Vec<Component> = base.components().collect();

    match (path.first(), base.first()) {
        (Some(a), Some(b)) if a == b => {}
        _ => return None,
    }

    let common = path
        .iter()
        .zip(base.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut rel = PathBuf::new();
    for _ in common..base.len() {
        rel.push("..");
    }
    for component in &path[common..] {
        rel.push(component.as_os_str());
    }
    if rel.as_os_str().is_empty() {
        rel.push(".");
    }
    Some(rel)
}

fn to_forward_slashes(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
