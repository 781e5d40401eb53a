//! Atomic archive replacement.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Global counter for unique temp file names within a process
static SWAP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A temp path next to `dest`: `{dest}.tmp.{pid}.{counter}`.
///
/// PID + atomic counter keeps concurrent writers apart, and staying in the
/// same directory keeps the final rename on one filesystem.
pub fn temp_sibling(dest: &Path) -> PathBuf {
    let counter = SWAP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let mut name = dest.as_os_str().to_os_string();
    name.push(format!(".tmp.{}.{}", std::process::id(), counter));
    PathBuf::from(name)
}

/// Move a fully written `temp` file over `dest`.
///
/// Readers see either the old file or the new one, never a partial write.
/// The temp file is removed if the rename fails.
pub fn atomic_replace(temp: &Path, dest: &Path) -> io::Result<()> {
    if let Err(e) = std::fs::rename(temp, dest) {
        let _ = std::fs::remove_file(temp);
        return Err(e);
    }
    Ok(())
}

/// Remove temp siblings of `dest` left behind by writers that died mid-write.
///
/// Only safe while no other writer for `dest` can be running, i.e. with the
/// key's lock held. Returns how many files were removed.
pub fn remove_stale_temps(dest: &Path) -> io::Result<usize> {
    let (Some(dir), Some(name)) = (dest.parent(), dest.file_name()) else {
        return Ok(0);
    };
    let mut prefix = name.to_os_string();
    prefix.push(".tmp.");
    let prefix = prefix.to_string_lossy().into_owned();

    let read_dir = match std::fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };

    let mut removed = 0;
    for entry in read_dir.flatten() {
        if !entry.file_name().to_string_lossy().starts_with(&prefix) {
            continue;
        }
        match std::fs::remove_file(entry.path()) {
            Ok(()) => removed += 1,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
    }
    Ok(removed)
}
