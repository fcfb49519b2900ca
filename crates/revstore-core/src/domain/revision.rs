//! RevisionRecord - one entry of a key's upload history.

use serde::{Deserialize, Serialize};

use super::key::RevisionKey;

/// RevisionRecord is derived from the store, never stored as such.
///
/// `timestamp` is the upload marker's recorded value (milliseconds since the
/// epoch when written by this crate).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionRecord {
    pub revision: RevisionKey,
    pub timestamp: u64,
    pub active: bool,
}

impl RevisionRecord {
    pub fn new(revision: RevisionKey, timestamp: u64, active: bool) -> Self {
        Self {
            revision,
            timestamp,
            active,
        }
    }
}
