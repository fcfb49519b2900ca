//! RevisionStore - versioned deployment artifacts over a NodeStore
//!
//! # Operations
//! - **upload**: write one artifact of a revision
//! - **trim_recent_uploads**: record the revision marker, prune old revisions
//! - **activate / active_revision**: switch and read the active pointer
//! - **fetch_revisions**: history with the active flag
//! - **will_deploy**: make sure the key's container nodes exist
//!
//! Every operation issues its store calls one after another. Concurrent callers
//! on the same key are arbitrated by the store's exclusive create only.

use crate::app::config::{ConfigError, StoreConfig};
use crate::app::ensurer::PathEnsurer;
use crate::domain::path::{join, parent_of};
use crate::domain::{
    Filename, Key, PathScheme, RevisionKey, RevisionRecord, StoreError, StoreResult,
};
use crate::ports::{Clock, NodeStore, SystemClock};

/// RevisionStore turns a hierarchical coordination store into a deployment
/// artifact store with bounded history and a switchable active revision.
///
/// # Example
/// ```ignore
/// let revisions = RevisionStore::new(store, StoreConfig::default())?;
/// let key = Key::new("my-app")?;
/// let rev = RevisionKey::new("abc123")?;
/// revisions.upload(&key, Some(&rev), &Filename::new("index.html")?, html).await?;
/// revisions.trim_recent_uploads(&key, Some(&rev)).await?;
/// revisions.activate(&key, &rev).await?;
/// ```
pub struct RevisionStore<S, C = SystemClock> {
    store: S,
    scheme: PathScheme,
    config: StoreConfig,
    clock: C,
}

impl<S: NodeStore> RevisionStore<S> {
    pub fn new(store: S, config: StoreConfig) -> Result<Self, ConfigError> {
        Self::with_clock(store, config, SystemClock)
    }
}

impl<S: NodeStore, C: Clock> RevisionStore<S, C> {
    /// Validates `config` up front so a bad prefix or retention fails here
    /// instead of on the first deploy.
    pub fn with_clock(store: S, config: StoreConfig, clock: C) -> Result<Self, ConfigError> {
        config.validate()?;
        let scheme = config.path_scheme()?;
        Ok(Self {
            store,
            scheme,
            config,
            clock,
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn ensurer(&self) -> PathEnsurer<'_, S> {
        PathEnsurer::new(&self.store)
    }

    /// Pre-deploy readiness: `<prefix>/<key>` and its `revisions` container exist.
    pub async fn will_deploy(&self, key: &Key) -> StoreResult<()> {
        self.ensurer().ensure(&self.scheme.revisions_root(key)).await
    }

    /// Store one artifact and return its node path.
    ///
    /// Without `allow_overwrite` an occupied path fails with `NodeExists`; the
    /// loser of a concurrent upload sees the same error. No retry either way.
    pub async fn upload(
        &self,
        key: &Key,
        revision: Option<&RevisionKey>,
        filename: &Filename,
        content: &[u8],
    ) -> StoreResult<String> {
        let revision = revision.cloned().unwrap_or_default();
        let ensurer = self.ensurer();
        ensurer.ensure(&self.scheme.revisions_root(key)).await?;

        let path = self.scheme.artifact_path(key, &revision, filename);
        if let Some(parent) = parent_of(&path) {
            ensurer.ensure(parent).await?;
        }

        if self.config.allow_overwrite {
            self.create_or_overwrite(&path, content).await?;
        } else {
            self.store.create_exclusive(&path, content).await?;
        }

        tracing::info!(%key, %revision, %path, bytes = content.len(), "artifact uploaded");
        Ok(path)
    }

    async fn create_or_overwrite(&self, path: &str, content: &[u8]) -> StoreResult<()> {
        match self.store.create_exclusive(path, content).await {
            Ok(()) => Ok(()),
            Err(err) if err.is_node_exists() => {
                tracing::debug!(path, "overwriting existing artifact");
                self.store.write(path, content).await
            }
            Err(err) => Err(err),
        }
    }

    /// Record `revision` in the key's history, then prune old revisions.
    ///
    /// Re-recording a revision that already has a marker is not an error, so
    /// the call is safe to repeat. Pruning is not transactional: a failure
    /// stops it where it is, and the next trim picks up from there.
    pub async fn trim_recent_uploads(
        &self,
        key: &Key,
        revision: Option<&RevisionKey>,
    ) -> StoreResult<()> {
        let revision = revision.cloned().unwrap_or_default();
        self.ensurer()
            .ensure(&self.scheme.revisions_root(key))
            .await?;

        let marker = self.scheme.revision_marker_path(key, &revision);
        let stamp = self.clock.now_millis().to_string();
        match self.store.create_exclusive(&marker, stamp.as_bytes()).await {
            Ok(()) => tracing::debug!(%key, %revision, "revision marker recorded"),
            Err(err) if err.is_node_exists() => {
                tracing::debug!(%key, %revision, "revision marker already recorded")
            }
            Err(err) => return Err(err),
        }

        let removed = self.prune(key).await?;
        if removed > 0 {
            tracing::info!(%key, removed, retention = self.config.retention, "old revisions pruned");
        }
        Ok(())
    }

    /// Remove the oldest `count - retention` revisions, skipping the active one.
    ///
    /// The active marker counts toward `retention` but is never removed, so a
    /// trim that would pick it leaves one marker more than `retention`.
    /// Age is the marker node's creation timestamp, never the revision name.
    async fn prune(&self, key: &Key) -> StoreResult<usize> {
        let root = self.scheme.revisions_root(key);
        let names = self.store.children(&root).await?;

        let mut markers = Vec::with_capacity(names.len());
        for name in names {
            let Ok(revision) = RevisionKey::new(name.clone()) else {
                tracing::warn!(%key, marker = %name, "skipping marker with malformed name");
                continue;
            };
            let marker = self.scheme.revision_marker_path(key, &revision);
            match self.store.creation_timestamp(&marker).await {
                Ok(created) => markers.push((created, revision)),
                // Removed by a concurrent trim.
                Err(err) if err.is_no_node() => continue,
                Err(err) => return Err(err),
            }
        }
        markers.sort_by_key(|(created, _)| *created);

        let active = self.active_revision(key).await?;
        let excess = markers.len().saturating_sub(self.config.retention);
        let doomed: Vec<RevisionKey> = markers
            .into_iter()
            .take(excess)
            .map(|(_, revision)| revision)
            .filter(|revision| Some(revision) != active.as_ref())
            .collect();

        for revision in &doomed {
            self.remove_revision(key, revision).await?;
        }
        Ok(doomed.len())
    }

    /// Artifacts go first, the marker last.
    async fn remove_revision(&self, key: &Key, revision: &RevisionKey) -> StoreResult<()> {
        self.remove_subtree(&self.scheme.revision_dir(key, revision))
            .await?;

        let marker = self.scheme.revision_marker_path(key, revision);
        match self.store.remove(&marker).await {
            Ok(()) => {}
            Err(err) if err.is_no_node() => {
                tracing::warn!(%key, %revision, "revision marker already removed")
            }
            Err(err) => return Err(err),
        }
        tracing::debug!(%key, %revision, "revision removed");
        Ok(())
    }

    /// Delete `root` and everything under it, children before parents.
    ///
    /// Uses only single-node removes. Nodes that vanish mid-walk are skipped.
    async fn remove_subtree(&self, root: &str) -> StoreResult<()> {
        let mut pending = vec![root.to_string()];
        let mut visited = Vec::new();
        while let Some(path) = pending.pop() {
            match self.store.children(&path).await {
                Ok(children) => {
                    pending.extend(children.iter().map(|child| join(&path, child)));
                }
                Err(err) if err.is_no_node() => continue,
                Err(err) => return Err(err),
            }
            visited.push(path);
        }

        // Every node was visited after its parent; reversed, leaves go first.
        for path in visited.iter().rev() {
            match self.store.remove(path).await {
                Ok(()) => {}
                Err(err) if err.is_no_node() => {}
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    /// The active revision, or `None` if the key was never activated or the
    /// pointer does not hold a usable revision key.
    pub async fn active_revision(&self, key: &Key) -> StoreResult<Option<RevisionKey>> {
        let pointer = self.scheme.active_pointer_path(key);
        let data = match self.store.read(&pointer).await {
            Ok(data) => data,
            Err(err) if err.is_no_node() => return Ok(None),
            Err(err) => return Err(err),
        };
        let value = String::from_utf8(data).map_err(|_| {
            StoreError::Backend(format!("active pointer {pointer} is not valid UTF-8"))
        })?;
        if value.is_empty() {
            return Ok(None);
        }
        match RevisionKey::new(value) {
            Ok(revision) => Ok(Some(revision)),
            Err(err) => {
                tracing::warn!(%key, %err, "ignoring malformed active pointer");
                Ok(None)
            }
        }
    }

    /// Point the key at `revision`, which must have a marker in its history.
    pub async fn activate(&self, key: &Key, revision: &RevisionKey) -> StoreResult<RevisionKey> {
        let known = match self.store.children(&self.scheme.revisions_root(key)).await {
            Ok(names) => names,
            Err(err) if err.is_no_node() => Vec::new(),
            Err(err) => return Err(err),
        };
        if !known.iter().any(|name| name == revision.as_str()) {
            return Err(StoreError::InvalidRevision(revision.to_string()));
        }

        let pointer = self.scheme.active_pointer_path(key);
        self.ensurer().ensure(&pointer).await?;
        self.store
            .write(&pointer, revision.as_str().as_bytes())
            .await?;

        tracing::info!(%key, %revision, "revision activated");
        Ok(revision.clone())
    }

    /// Revision history in the order the store lists the markers.
    ///
    /// A key that was never uploaded has an empty history.
    pub async fn fetch_revisions(&self, key: &Key) -> StoreResult<Vec<RevisionRecord>> {
        let names = match self.store.children(&self.scheme.revisions_root(key)).await {
            Ok(names) => names,
            Err(err) if err.is_no_node() => return Ok(Vec::new()),
            Err(err) => return Err(err),
        };

        let mut stamped = Vec::with_capacity(names.len());
        for name in names {
            let Ok(revision) = RevisionKey::new(name.clone()) else {
                tracing::warn!(%key, marker = %name, "skipping marker with malformed name");
                continue;
            };
            match self.marker_timestamp(key, &revision).await {
                Ok(timestamp) => stamped.push((revision, timestamp)),
                Err(err) if err.is_no_node() => continue,
                Err(err) => return Err(err),
            }
        }

        let active = self.active_revision(key).await?;
        Ok(stamped
            .into_iter()
            .map(|(revision, timestamp)| {
                let is_active = active.as_ref() == Some(&revision);
                RevisionRecord::new(revision, timestamp, is_active)
            })
            .collect())
    }

    /// The marker's recorded upload time, or its creation timestamp when the
    /// payload is not a number (markers written by other tools).
    async fn marker_timestamp(&self, key: &Key, revision: &RevisionKey) -> StoreResult<u64> {
        let marker = self.scheme.revision_marker_path(key, revision);
        let data = self.store.read(&marker).await?;
        let recorded = std::str::from_utf8(&data)
            .ok()
            .and_then(|value| value.trim().parse::<u64>().ok());
        match recorded {
            Some(timestamp) => Ok(timestamp),
            None => self.store.creation_timestamp(&marker).await,
        }
    }

    /// Content of one artifact of one revision.
    pub async fn fetch(
        &self,
        key: &Key,
        revision: &RevisionKey,
        filename: &Filename,
    ) -> StoreResult<Vec<u8>> {
        self.store
            .read(&self.scheme.artifact_path(key, revision, filename))
            .await
    }

    /// Content of one artifact of the active revision, `None` if nothing is active.
    pub async fn fetch_active(&self, key: &Key, filename: &Filename) -> StoreResult<Option<Vec<u8>>> {
        match self.active_revision(key).await? {
            Some(revision) => self.fetch(key, &revision, filename).await.map(Some),
            None => Ok(None),
        }
    }
}
