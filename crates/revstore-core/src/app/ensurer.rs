//! PathEnsurer - idempotent creation of a path and all its ancestors.

use crate::domain::StoreResult;
use crate::domain::path::partial_paths;
use crate::ports::NodeStore;

/// PathEnsurer walks a path root-first and creates every missing segment.
///
/// Never fails because a segment already exists, so two callers ensuring
/// overlapping paths (`/a/b` and `/a/b/c`) both succeed.
pub struct PathEnsurer<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S: NodeStore + ?Sized> PathEnsurer<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub async fn ensure(&self, path: &str) -> StoreResult<()> {
        for partial in partial_paths(path) {
            self.store.create_or_noop(&partial, &[]).await?;
        }
        tracing::debug!(path, "path ensured");
        Ok(())
    }
}
