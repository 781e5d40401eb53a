//! Clone git repositories through a local, time-bounded tarball cache.
//!
//! The first clone of a URL is archived under the per-user cache directory;
//! later clones within 24 hours unpack that archive and pull instead of
//! downloading the full history again. Concurrent processes coordinate
//! through one file lock per cache key.

pub mod cache;
mod clone;
mod error;
pub mod platform;
pub mod process;
pub mod snapshot;
pub mod types;
pub mod workspace;

#[cfg(test)]
mod test_support;

pub use cache::{CacheEntry, CachePaths, CacheStore};
pub use clone::{CloneOutcome, FastClone, fastclone};
pub use error::CloneError;
pub use platform::Platform;
pub use process::{CommandError, CommandRunner, SystemRunner};
pub use types::{CacheKey, RepoRef};
