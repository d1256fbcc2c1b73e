//! Blob storage for offloaded deltas.
//!
//! Deltas too large to inline in a change record are written here, keyed by
//! `(otu_id, version)`, and the record carries the `"file"` marker instead.
//! Blobs are write-once, read-many; a missing blob is a fatal
//! data-integrity failure, not a retriable condition.

use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use otulog_diff::Delta;
use otulog_types::{OtuId, OtuVersion};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::debug;

/// Write-once blob storage for offloaded deltas, keyed by OTU id and
/// version.
#[async_trait]
pub trait DiffStore: Send + Sync {
    /// Persists the delta for `(otu_id, version)`.
    async fn write_diff(
        &self,
        otu_id: &OtuId,
        version: OtuVersion,
        delta: &Delta,
    ) -> StoreResult<()>;

    /// Loads the delta for `(otu_id, version)`.
    ///
    /// Fails with [`StoreError::MissingDiff`] if no blob exists for the key.
    async fn read_diff(&self, otu_id: &OtuId, version: OtuVersion) -> StoreResult<Delta>;
}

/// Filesystem-backed diff store.
///
/// One JSON file per delta at `<root>/<otu_id>_<version>.json`.
pub struct FsDiffStore {
    root: PathBuf,
}

impl FsDiffStore {
    /// Creates a store rooted at `root`, creating the directory if needed.
    pub fn new(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn diff_path(&self, otu_id: &OtuId, version: OtuVersion) -> PathBuf {
        self.root.join(format!("{otu_id}_{version}.json"))
    }
}

#[async_trait]
impl DiffStore for FsDiffStore {
    async fn write_diff(
        &self,
        otu_id: &OtuId,
        version: OtuVersion,
        delta: &Delta,
    ) -> StoreResult<()> {
        let path = self.diff_path(otu_id, version);
        let encoded = serde_json::to_vec(delta)?;
        tokio::fs::write(&path, encoded).await?;
        debug!(otu_id = %otu_id, %version, path = %path.display(), "wrote offloaded diff");
        Ok(())
    }

    async fn read_diff(&self, otu_id: &OtuId, version: OtuVersion) -> StoreResult<Delta> {
        let path = self.diff_path(otu_id, version);
        let encoded = match tokio::fs::read(&path).await {
            Ok(encoded) => encoded,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(StoreError::MissingDiff {
                    otu_id: otu_id.clone(),
                    version,
                });
            }
            Err(err) => return Err(err.into()),
        };
        Ok(serde_json::from_slice(&encoded)?)
    }
}

/// In-memory diff store for tests and embedding.
#[derive(Default)]
pub struct MemoryDiffStore {
    diffs: RwLock<HashMap<(OtuId, OtuVersion), Delta>>,
}

impl MemoryDiffStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored deltas.
    pub async fn len(&self) -> usize {
        self.diffs.read().await.len()
    }
}

#[async_trait]
impl DiffStore for MemoryDiffStore {
    async fn write_diff(
        &self,
        otu_id: &OtuId,
        version: OtuVersion,
        delta: &Delta,
    ) -> StoreResult<()> {
        self.diffs
            .write()
            .await
            .insert((otu_id.clone(), version), delta.clone());
        Ok(())
    }

    async fn read_diff(&self, otu_id: &OtuId, version: OtuVersion) -> StoreResult<Delta> {
        self.diffs
            .read()
            .await
            .get(&(otu_id.clone(), version))
            .cloned()
            .ok_or_else(|| StoreError::MissingDiff {
                otu_id: otu_id.clone(),
                version,
            })
    }
}
