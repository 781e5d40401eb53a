//! Shared types for fastclone

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use sha2::{Digest, Sha224};
use thiserror::Error;

/// Number of hex characters in a SHA-224 digest.
pub const KEY_LEN: usize = 56;

/// Error type for parsing failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("value cannot be empty")]
    Empty,
    #[error("invalid character in value: {0}")]
    InvalidCharacter(char),
    #[error("expected {expected} characters, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

/// Cache key for a repository URL.
///
/// The lowercase hex SHA-224 digest of the URL bytes. Only the URL feeds the
/// digest, so two clones of the same URL share an entry regardless of branch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for a repository URL.
    pub fn derive(url: &str) -> Self {
        let digest = Sha224::digest(url.as_bytes());
        CacheKey(hex::encode(digest))
    }

    /// Returns the key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for CacheKey {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ParseError::Empty);
        }

        if s.len() != KEY_LEN {
            return Err(ParseError::InvalidLength {
                expected: KEY_LEN,
                actual: s.len(),
            });
        }

        for c in s.chars() {
            if !matches!(c, '0'..='9' | 'a'..='f') {
                return Err(ParseError::InvalidCharacter(c));
            }
        }

        Ok(CacheKey(s.to_string()))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What to fetch, and optionally which ref to check out afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub url: String,
    pub branch: Option<String>,
}

impl RepoRef {
    /// Reference to the default branch of `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            branch: None,
        }
    }

    /// Check out `branch` after materializing.
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    /// Cache key for this reference's URL.
    pub fn key(&self) -> CacheKey {
        CacheKey::derive(&self.url)
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.branch {
            Some(branch) => write!(f, "{}#{}", self.url, branch),
            None => write!(f, "{}", self.url),
        }
    }
}
