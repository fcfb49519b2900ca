//! revstore-core
//!
//! Revision-indexed deployment artifacts on top of a hierarchical
//! coordination store (Zookeeper-like).
//!
//! # Modules
//! - **domain**: keys, path layout, revision records, errors
//! - **ports**: NodeStore and Clock
//! - **impls**: InMemoryNodeStore
//! - **app**: PathEnsurer, RevisionStore, StoreConfig

pub mod app;
pub mod domain;
pub mod impls;
pub mod ports;

pub use app::{ConfigError, PathEnsurer, RevisionStore, StoreConfig};
pub use domain::{Filename, Key, RevisionKey, RevisionRecord, StoreError, StoreResult};
pub use ports::NodeStore;
