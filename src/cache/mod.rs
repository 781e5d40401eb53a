//! Archive cache: paths, freshness, locking

mod lock;
mod paths;
mod staleness;
mod store;
mod swap;

pub use lock::KeyLock;
pub use paths::{ARCHIVE_EXT, CachePaths};
pub use staleness::{DEFAULT_MAX_AGE, is_fresh, is_fresh_at};
pub use store::{CacheEntry, CacheStore};
pub use swap::{atomic_replace, remove_stale_temps, temp_sibling};
