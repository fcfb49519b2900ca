//! InMemoryNodeStore - reference NodeStore for tests and demos
//!
//! A flat ordered map from absolute path to node. Children are derived by
//! prefix range over the map, creation timestamps come from a monotonic
//! transaction counter (like a zxid).

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::path::{ROOT, parent_of};
use crate::domain::{StoreError, StoreResult};
use crate::ports::NodeStore;

/// Primitive names, used to target injected failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Exists,
    Create,
    Write,
    Read,
    Children,
    Remove,
    CreationTimestamp,
}

#[derive(Debug, Clone)]
struct Node {
    data: Vec<u8>,
    /// Transaction id at creation.
    created: u64,
    /// Transaction id of the last write.
    modified: u64,
    version: u32,
}

struct InMemoryState {
    nodes: BTreeMap<String, Node>,

    /// Next transaction id to assign.
    next_txid: u64,

    /// One-shot failures, consumed in insertion order per op.
    faults: Vec<(StoreOp, StoreError)>,
}

impl InMemoryState {
    fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(
            ROOT.to_string(),
            Node {
                data: Vec::new(),
                created: 0,
                modified: 0,
                version: 0,
            },
        );
        Self {
            nodes,
            next_txid: 1,
            faults: Vec::new(),
        }
    }

    fn allocate_txid(&mut self) -> u64 {
        let id = self.next_txid;
        self.next_txid += 1;
        id
    }

    fn take_fault(&mut self, op: StoreOp) -> StoreResult<()> {
        if let Some(idx) = self.faults.iter().position(|(target, _)| *target == op) {
            let (_, err) = self.faults.remove(idx);
            tracing::debug!(?op, %err, "injected store failure");
            return Err(err);
        }
        Ok(())
    }

    fn node(&self, path: &str) -> StoreResult<&Node> {
        self.nodes
            .get(path)
            .ok_or_else(|| StoreError::NoNode(path.to_string()))
    }

    fn child_names(&self, path: &str) -> Vec<String> {
        let prefix = if path == ROOT {
            ROOT.to_string()
        } else {
            format!("{path}/")
        };
        self.nodes
            .range(prefix.clone()..)
            .take_while(|(candidate, _)| candidate.starts_with(&prefix))
            .filter_map(|(candidate, _)| {
                let rest = &candidate[prefix.len()..];
                (!rest.is_empty() && !rest.contains('/')).then(|| rest.to_string())
            })
            .collect()
    }

    fn create(&mut self, path: &str, payload: &[u8]) -> StoreResult<()> {
        if self.nodes.contains_key(path) {
            return Err(StoreError::NodeExists(path.to_string()));
        }
        // parent_of only returns None for the root, which always exists.
        if let Some(parent) = parent_of(path)
            && !self.nodes.contains_key(parent)
        {
            return Err(StoreError::NoNode(parent.to_string()));
        }
        let txid = self.allocate_txid();
        self.nodes.insert(
            path.to_string(),
            Node {
                data: payload.to_vec(),
                created: txid,
                modified: txid,
                version: 0,
            },
        );
        Ok(())
    }
}

fn validate_path(path: &str) -> StoreResult<()> {
    if path == ROOT {
        return Ok(());
    }
    let well_formed = path.starts_with('/')
        && !path.ends_with('/')
        && !path[1..].split('/').any(str::is_empty);
    if well_formed {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(format!("invalid node path `{path}`")))
    }
}

/// InMemoryNodeStore keeps every node in process memory.
///
/// Cloning shares the same underlying tree, so a test can hand one clone to a
/// `RevisionStore` and inspect the tree through another.
///
/// # Semantics
/// - `/` always exists
/// - creating a node requires its parent (`NoNode(parent)` otherwise)
/// - removing a node with children fails with `NotEmpty`
/// - `children` returns names in lexical order
#[derive(Clone)]
pub struct InMemoryNodeStore {
    state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryNodeStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(InMemoryState::new())),
        }
    }

    /// Every path in the tree except the root, in lexical order.
    pub async fn paths(&self) -> Vec<String> {
        let state = self.state.lock().await;
        state
            .nodes
            .keys()
            .filter(|path| path.as_str() != ROOT)
            .cloned()
            .collect()
    }

    /// Number of writes applied to a node since it was created.
    pub async fn version(&self, path: &str) -> StoreResult<u32> {
        let state = self.state.lock().await;
        state.node(path).map(|node| node.version)
    }

    /// Transaction id of the last write to a node.
    pub async fn modified(&self, path: &str) -> StoreResult<u64> {
        let state = self.state.lock().await;
        state.node(path).map(|node| node.modified)
    }

    /// Make the next call of `op` fail with `err`.
    ///
    /// Faults queue up: registering the same op twice fails its next two calls.
    pub async fn fail_next(&self, op: StoreOp, err: StoreError) {
        let mut state = self.state.lock().await;
        state.faults.push((op, err));
    }
}

impl Default for InMemoryNodeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NodeStore for InMemoryNodeStore {
    async fn exists(&self, path: &str) -> StoreResult<bool> {
        validate_path(path)?;
        let mut state = self.state.lock().await;
        state.take_fault(StoreOp::Exists)?;
        Ok(state.nodes.contains_key(path))
    }

    async fn create_exclusive(&self, path: &str, payload: &[u8]) -> StoreResult<()> {
        validate_path(path)?;
        let mut state = self.state.lock().await;
        state.take_fault(StoreOp::Create)?;
        state.create(path, payload)
    }

    async fn create_or_noop(&self, path: &str, payload: &[u8]) -> StoreResult<()> {
        validate_path(path)?;
        let mut state = self.state.lock().await;
        state.take_fault(StoreOp::Create)?;
        if state.nodes.contains_key(path) {
            return Ok(());
        }
        state.create(path, payload)
    }

    async fn write(&self, path: &str, payload: &[u8]) -> StoreResult<()> {
        validate_path(path)?;
        let mut state = self.state.lock().await;
        state.take_fault(StoreOp::Write)?;
        let txid = state.allocate_txid();
        let node = state
            .nodes
            .get_mut(path)
            .ok_or_else(|| StoreError::NoNode(path.to_string()))?;
        node.data = payload.to_vec();
        node.modified = txid;
        node.version += 1;
        Ok(())
    }

    async fn read(&self, path: &str) -> StoreResult<Vec<u8>> {
        validate_path(path)?;
        let mut state = self.state.lock().await;
        state.take_fault(StoreOp::Read)?;
        state.node(path).map(|node| node.data.clone())
    }

    async fn children(&self, path: &str) -> StoreResult<Vec<String>> {
        validate_path(path)?;
        let mut state = self.state.lock().await;
        state.take_fault(StoreOp::Children)?;
        state.node(path)?;
        Ok(state.child_names(path))
    }

    async fn remove(&self, path: &str) -> StoreResult<()> {
        validate_path(path)?;
        if path == ROOT {
            return Err(StoreError::InvalidKey("cannot remove the root node".to_string()));
        }
        let mut state = self.state.lock().await;
        state.take_fault(StoreOp::Remove)?;
        state.node(path)?;
        if !state.child_names(path).is_empty() {
            return Err(StoreError::NotEmpty(path.to_string()));
        }
        state.nodes.remove(path);
        Ok(())
    }

    async fn creation_timestamp(&self, path: &str) -> StoreResult<u64> {
        validate_path(path)?;
        let mut state = self.state.lock().await;
        state.take_fault(StoreOp::CreationTimestamp)?;
        state.node(path).map(|node| node.created)
    }
}
