//! Domain model (keys, path layout, revision records, errors).

pub mod errors;
pub mod key;
pub mod path;
pub mod revision;

pub use self::errors::{StoreError, StoreResult};
pub use self::key::{Filename, Key, RevisionKey};
pub use self::path::PathScheme;
pub use self::revision::RevisionRecord;
