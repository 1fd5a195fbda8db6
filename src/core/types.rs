//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`ClaimPath`] - Validated, pre-split claim path
//! - [`Fingerprint`] - Content hash of a serialized claim tree
//!
//! # Validation
//!
//! These types enforce validity at construction time. A path that cannot
//! address a tree node cannot be represented.
//!
//! # Examples
//!
//! ```
//! use claimledger::core::types::ClaimPath;
//!
//! let dotted = ClaimPath::new("protocols.claim.claimers").unwrap();
//! assert_eq!(dotted.segments(), ["protocols", "claim", "claimers"]);
//!
//! // Slash form lets a key carry a literal dot.
//! let slashed = ClaimPath::new("hosts/example.com").unwrap();
//! assert_eq!(slashed.segments(), ["hosts", "example.com"]);
//!
//! assert!(ClaimPath::new("").is_err());
//! assert!(ClaimPath::new("a..b").is_err());
//! ```

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid claim path: {0}")]
    InvalidPath(String),
}

/// A validated claim path.
///
/// A path is written either dotted (`a.b.c`) or slash-delimited (`a/b/c`).
/// If the text contains a `/` it is split on `/` only, otherwise on `.`.
/// Every segment is an object key; numeric segments such as `1` are keys,
/// never array indices.
///
/// Rules:
/// - Cannot be empty
/// - Cannot contain empty segments (`a..b`, `.a`, `a/`)
/// - Cannot contain ASCII control characters
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClaimPath {
    raw: String,
    segments: Vec<String>,
}

impl ClaimPath {
    /// Parse and validate a claim path.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidPath` if the path is empty, has an empty
    /// segment, or contains control characters.
    pub fn new(path: impl Into<String>) -> Result<Self, TypeError> {
        let raw = path.into();
        let segments = Self::split(&raw)?;
        Ok(Self { raw, segments })
    }

    fn split(raw: &str) -> Result<Vec<String>, TypeError> {
        if raw.is_empty() {
            return Err(TypeError::InvalidPath("path cannot be empty".into()));
        }

        if raw.chars().any(|c| c.is_ascii_control()) {
            return Err(TypeError::InvalidPath(
                "path cannot contain control characters".into(),
            ));
        }

        let delimiter = if raw.contains('/') { '/' } else { '.' };
        let segments: Vec<String> = raw.split(delimiter).map(str::to_string).collect();

        if segments.iter().any(String::is_empty) {
            return Err(TypeError::InvalidPath(format!(
                "path '{}' contains an empty segment",
                raw
            )));
        }

        Ok(segments)
    }

    /// The path as it was written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The object keys this path walks, root first.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Split into the parent keys and the final key.
    pub(crate) fn split_last(&self) -> (&[String], &str) {
        // `split` guarantees at least one segment.
        match self.segments.split_last() {
            Some((last, parents)) => (parents, last.as_str()),
            None => (&[], self.raw.as_str()),
        }
    }
}

impl TryFrom<String> for ClaimPath {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for ClaimPath {
    type Error = TypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ClaimPath> for String {
    fn from(path: ClaimPath) -> Self {
        path.raw
    }
}

impl std::fmt::Display for ClaimPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// A content hash of a serialized claim tree.
///
/// Two ledgers holding the same claims produce the same fingerprint, so
/// persisted claim files can be compared without parsing them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Hash the given canonical bytes.
    pub fn compute(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Self(hex::encode(hasher.finalize()))
    }

    /// Get the fingerprint as a hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sha256:{}", self.0)
    }
}
