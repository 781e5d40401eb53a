//! Freshness checking for cached archives.

use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

/// Default freshness window (24 hours).
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

/// Check if an archive is fresh right now. See [`is_fresh_at`].
pub fn is_fresh(archive: &Path, max_age: Duration) -> bool {
    is_fresh_at(archive, max_age, SystemTime::now())
}

/// Check if an archive was modified less than `max_age` before `now`.
///
/// Returns false if:
/// - The archive doesn't exist
/// - We can't read its modification time
/// - It is `max_age` old or older
///
/// A modification time in the future counts as fresh.
pub fn is_fresh_at(archive: &Path, max_age: Duration, now: SystemTime) -> bool {
    let metadata = match fs::metadata(archive) {
        Ok(m) => m,
        Err(_) => return false, // Doesn't exist or can't read -> rebuild
    };

    let modified = match metadata.modified() {
        Ok(t) => t,
        Err(_) => return false,
    };

    match now.duration_since(modified) {
        Ok(age) => age < max_age,
        Err(_) => true,
    }
}

/// Age of an archive relative to `now`, zero if modified in the future.
pub fn age_at(modified: SystemTime, now: SystemTime) -> Duration {
    now.duration_since(modified).unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::{FileTime, set_file_mtime};
    use tempfile::tempdir;

    const HOUR: Duration = Duration::from_secs(3600);

    fn archive_aged(dir: &Path, age: Duration, now: SystemTime) -> std::path::PathBuf {
        let archive = dir.join("abc.tar");
        fs::write(&archive, b"archive").unwrap();
        set_file_mtime(&archive, FileTime::from_system_time(now - age)).unwrap();
        archive
    }

    #[test]
    fn test_missing_archive_is_not_fresh() {
        let path = Path::new("/nonexistent/path/to/archive.tar");
        assert!(!is_fresh(path, DEFAULT_MAX_AGE));
    }

    #[test]
    fn test_new_archive_is_fresh() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("abc.tar");
        fs::write(&archive, b"archive").unwrap();
        assert!(is_fresh(&archive, DEFAULT_MAX_AGE));
    }

    #[test]
    fn test_23_hours_old_is_fresh() {
        let dir = tempdir().unwrap();
        let now = SystemTime::now();
        let archive = archive_aged(dir.path(), 23 * HOUR, now);
        assert!(is_fresh_at(&archive, DEFAULT_MAX_AGE, now));
    }

    #[test]
    fn test_just_past_window_is_stale() {
        let dir = tempdir().unwrap();
        let now = SystemTime::now();
        let archive = archive_aged(dir.path(), 24 * HOUR + Duration::from_secs(1), now);
        assert!(!is_fresh_at(&archive, DEFAULT_MAX_AGE, now));
    }

    #[test]
    fn test_custom_window() {
        let dir = tempdir().unwrap();
        let now = SystemTime::now();
        let archive = archive_aged(dir.path(), 2 * HOUR, now);

        assert!(!is_fresh_at(&archive, HOUR, now));
        assert!(is_fresh_at(&archive, 3 * HOUR, now));
    }

    #[test]
    fn test_future_mtime_is_fresh() {
        let dir = tempdir().unwrap();
        let now = SystemTime::now();
        let archive = dir.path().join("abc.tar");
        fs::write(&archive, b"archive").unwrap();
        set_file_mtime(&archive, FileTime::from_system_time(now + HOUR)).unwrap();
        assert!(is_fresh_at(&archive, DEFAULT_MAX_AGE, now));
    }

    #[test]
    fn test_age_at_clamps_future() {
        let now = SystemTime::now();
        assert_eq!(age_at(now + HOUR, now), Duration::ZERO);
        assert_eq!(age_at(now - HOUR, now), HOUR);
    }
}
