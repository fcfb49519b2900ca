//! Key, RevisionKey, Filename - validated path segments
//!
//! These newtypes are the only way to get caller input into a node path, so
//! every path built by [`PathScheme`](super::PathScheme) is well-formed.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::{StoreError, StoreResult};

/// Key identifies one deployable unit.
///
/// It may span several segments (`nested/key`). Surrounding `/` are trimmed so
/// `/nested/key` and `nested/key` name the same node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Key(String);

impl Key {
    pub fn new(value: impl Into<String>) -> StoreResult<Self> {
        let value = value.into();
        let trimmed = value.trim_matches('/');
        if trimmed.is_empty() {
            return Err(StoreError::InvalidKey("key must not be empty".to_string()));
        }
        if trimmed.split('/').any(str::is_empty) {
            return Err(StoreError::InvalidKey(format!(
                "key `{value}` contains an empty segment"
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Key {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Key> for String {
    fn from(key: Key) -> Self {
        key.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// RevisionKey identifies one upload of a Key.
///
/// A single path segment. `revisions` is reserved because it is the name of the
/// marker container that sits next to the revision directories.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RevisionKey(String);

impl RevisionKey {
    /// Used when the caller does not name a revision.
    pub const DEFAULT: &'static str = "default";

    /// Name of the marker container under every key.
    pub const RESERVED: &'static str = "revisions";

    pub fn new(value: impl Into<String>) -> StoreResult<Self> {
        let value = value.into();
        if value.is_empty() {
            return Err(StoreError::InvalidKey(
                "revision key must not be empty".to_string(),
            ));
        }
        if value.contains('/') {
            return Err(StoreError::InvalidKey(format!(
                "revision key `{value}` must be a single path segment"
            )));
        }
        if value == Self::RESERVED {
            return Err(StoreError::InvalidKey(format!(
                "revision key `{value}` is reserved"
            )));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RevisionKey {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl TryFrom<String> for RevisionKey {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RevisionKey> for String {
    fn from(revision: RevisionKey) -> Self {
        revision.0
    }
}

impl PartialEq<str> for RevisionKey {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for RevisionKey {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl fmt::Display for RevisionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Filename of one uploaded artifact, relative to its revision directory.
///
/// May span several segments (`assets/app.js`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Filename(String);

impl Filename {
    pub fn new(value: impl Into<String>) -> StoreResult<Self> {
        let value = value.into();
        let trimmed = value.trim_matches('/');
        if trimmed.is_empty() || trimmed.split('/').any(str::is_empty) {
            return Err(StoreError::InvalidKey(format!(
                "filename `{value}` is not a valid relative path"
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Filename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
