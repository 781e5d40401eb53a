use std::io;

use thiserror::Error;

use crate::process::CommandError;

/// Errors returned by fastclone operations.
#[derive(Error, Debug)]
pub enum CloneError {
    /// An external program (git, tar, attrib) failed.
    #[error(transparent)]
    Command(#[from] CommandError),
    /// A fresh clone reported local changes; nothing was archived.
    #[error("fastclone: working tree not clean after cloning {url}")]
    DirtyClone { url: String },
    /// The scratch directory could not be removed.
    #[error("failed to remove scratch directory: {0}")]
    ScratchCleanup(#[source] io::Error),
    /// An underlying IO operation failed.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    /// Invalid inputs were provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}
