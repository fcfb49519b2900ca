//! App - revision logic built on the ports
//!
//! # Components
//! - **StoreConfig**: key prefix, overwrite flag, retention
//! - **PathEnsurer**: idempotent path creation
//! - **RevisionStore**: upload, trim, activate, history

pub mod config;
pub mod ensurer;
pub mod revision_store;

pub use self::config::{ConfigError, DEFAULT_RETENTION, StoreConfig};
pub use self::ensurer::PathEnsurer;
pub use self::revision_store::RevisionStore;
