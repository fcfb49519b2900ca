//! PathScheme - the node namespace layout
//!
//! ```text
//! <keyPrefix>/<key>                          active RevisionKey
//! <keyPrefix>/<key>/revisions                marker container
//! <keyPrefix>/<key>/revisions/<revisionKey>  upload marker
//! <keyPrefix>/<key>/<revisionKey>/<filename> artifact content
//! ```
//!
//! Pure functions only. All returned paths are absolute.

use super::errors::{StoreError, StoreResult};
use super::key::{Filename, Key, RevisionKey};

pub const ROOT: &str = "/";

const REVISIONS: &str = "revisions";

/// PathScheme maps (prefix, key, revision, filename) onto node paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathScheme {
    /// Either empty (keys live under `/`) or `/seg[/seg...]` without a trailing slash.
    prefix: String,
}

impl PathScheme {
    pub fn new(key_prefix: &str) -> StoreResult<Self> {
        let trimmed = key_prefix.trim_matches('/');
        if trimmed.is_empty() {
            return Ok(Self {
                prefix: String::new(),
            });
        }
        if trimmed.split('/').any(str::is_empty) {
            return Err(StoreError::InvalidKey(format!(
                "key prefix `{key_prefix}` contains an empty segment"
            )));
        }
        Ok(Self {
            prefix: format!("/{trimmed}"),
        })
    }

    /// `<keyPrefix>/<key>`: holds the active RevisionKey.
    pub fn active_pointer_path(&self, key: &Key) -> String {
        format!("{}/{}", self.prefix, key)
    }

    /// `<keyPrefix>/<key>/revisions`
    pub fn revisions_root(&self, key: &Key) -> String {
        format!("{}/{REVISIONS}", self.active_pointer_path(key))
    }

    /// `<keyPrefix>/<key>/revisions/<revisionKey>`
    pub fn revision_marker_path(&self, key: &Key, revision: &RevisionKey) -> String {
        format!("{}/{}", self.revisions_root(key), revision)
    }

    /// `<keyPrefix>/<key>/<revisionKey>`: parent of every artifact of one revision.
    pub fn revision_dir(&self, key: &Key, revision: &RevisionKey) -> String {
        format!("{}/{}", self.active_pointer_path(key), revision)
    }

    /// `<keyPrefix>/<key>/<revisionKey>/<filename>`
    pub fn artifact_path(&self, key: &Key, revision: &RevisionKey, filename: &Filename) -> String {
        format!("{}/{}", self.revision_dir(key, revision), filename)
    }
}

/// Append one child name to an absolute path.
pub fn join(parent: &str, child: &str) -> String {
    if parent == ROOT {
        format!("/{child}")
    } else {
        format!("{parent}/{child}")
    }
}

/// Parent of an absolute path; `None` for the root.
pub fn parent_of(path: &str) -> Option<&str> {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.rfind('/') {
        Some(0) => Some(ROOT),
        Some(idx) => Some(&trimmed[..idx]),
        None => None,
    }
}

/// Every partial path from the first segment to the full path, root-ward first.
///
/// `/a/b/c` yields `/a`, `/a/b`, `/a/b/c`. Empty segments are skipped.
pub fn partial_paths(path: &str) -> Vec<String> {
    let mut current = String::new();
    let mut partials = Vec::new();
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        current.push('/');
        current.push_str(segment);
        partials.push(current.clone());
    }
    partials
}
