//! NodeStore port - hierarchical coordination store (Zookeeper-like)
//!
//! NodeStore is the thin contract this crate needs from a coordination client.
//! Session handling, reconnection, authentication and timeouts belong to the
//! client behind it and are invisible here.
//!
//! # Implementations
//! - **InMemoryNodeStore** (`impls::inmem_node_store`): tests and demos

use async_trait::async_trait;

use crate::domain::{StoreError, StoreResult};

/// NodeStore exposes the coordination-service primitives over a connected session.
///
/// # Contract
/// - Paths are absolute (`/`-rooted). Creating a node whose parent is absent may
///   fail with `NoNode`; callers ensure parents first.
/// - `create_exclusive` is the only race detector. Its atomicity is the
///   coordination service's, nothing here re-implements locking.
/// - `remove` on a node with children is implementation-defined. Callers delete
///   children explicitly and never rely on recursive delete.
#[async_trait]
pub trait NodeStore: Send + Sync {
    async fn exists(&self, path: &str) -> StoreResult<bool>;

    /// Create a node, failing with `NodeExists` if the path is present.
    async fn create_exclusive(&self, path: &str, payload: &[u8]) -> StoreResult<()>;

    /// Overwrite an existing node's payload, failing with `NoNode` if absent.
    async fn write(&self, path: &str, payload: &[u8]) -> StoreResult<()>;

    /// Read a node's payload, failing with `NoNode` if absent.
    async fn read(&self, path: &str) -> StoreResult<Vec<u8>>;

    /// Names (not paths) of the direct children. `NoNode` if the path is absent.
    async fn children(&self, path: &str) -> StoreResult<Vec<String>>;

    /// Remove a node, failing with `NoNode` if absent.
    async fn remove(&self, path: &str) -> StoreResult<()>;

    /// Creation order marker: non-decreasing across nodes in creation order.
    async fn creation_timestamp(&self, path: &str) -> StoreResult<u64>;

    /// Create a node unless it already exists.
    ///
    /// Clients with a native "create if absent" primitive can override this.
    async fn create_or_noop(&self, path: &str, payload: &[u8]) -> StoreResult<()> {
        match self.create_exclusive(path, payload).await {
            Ok(()) | Err(StoreError::NodeExists(_)) => Ok(()),
            Err(err) => Err(err),
        }
    }
}
