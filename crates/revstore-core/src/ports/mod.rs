//! Ports - capabilities this crate consumes
//!
//! Each trait hides an external system behind an interface so the revision
//! logic can run against a real coordination client or an in-memory store.

pub mod clock;
pub mod node_store;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::node_store::NodeStore;
