//! Errors - store and revision error taxonomy
//!
//! Every failure from the coordination store is surfaced unchanged. Nothing in
//! this crate retries; callers own retry policy.

use thiserror::Error;

/// StoreError covers both the NodeStore primitives and the revision operations
/// built on top of them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Exclusive create hit a path that is already present.
    #[error("Value already exists for key: {0}")]
    NodeExists(String),

    /// Read, write, list or remove on an absent path.
    #[error("no node at path: {0}")]
    NoNode(String),

    /// Remove on a node that still has children.
    #[error("node has children: {0}")]
    NotEmpty(String),

    /// Activation target has no marker under `revisions/`.
    #[error("`{0}` is not a valid revision key")]
    InvalidRevision(String),

    /// Malformed key, revision key or filename.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Opaque transport or session failure reported by the coordination client.
    #[error("coordination store failure: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn is_no_node(&self) -> bool {
        matches!(self, StoreError::NoNode(_))
    }

    pub fn is_node_exists(&self) -> bool {
        matches!(self, StoreError::NodeExists(_))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
