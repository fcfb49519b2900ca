//! Impls - port implementations shipped with the crate
//!
//! Production coordination clients live outside this crate and implement
//! `ports::NodeStore` directly.

pub mod inmem_node_store;

pub use self::inmem_node_store::{InMemoryNodeStore, StoreOp};
