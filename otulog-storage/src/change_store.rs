//! The append-only change log.

use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use otulog_types::{ChangeId, ChangeRecord, OtuId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Filter for aggregate queries over the change log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeFilter {
    /// Restrict to changes of one OTU.
    pub otu_id: Option<OtuId>,
    /// Restrict to changes within one reference.
    pub reference_id: Option<String>,
}

impl ChangeFilter {
    /// Matches every change.
    #[must_use]
    pub fn any() -> Self {
        Self::default()
    }

    /// Restricts the filter to one OTU.
    #[must_use]
    pub fn for_otu(otu_id: OtuId) -> Self {
        Self {
            otu_id: Some(otu_id),
            reference_id: None,
        }
    }

    /// Restricts the filter to one reference.
    #[must_use]
    pub fn for_reference(reference_id: impl Into<String>) -> Self {
        Self {
            otu_id: None,
            reference_id: Some(reference_id.into()),
        }
    }

    fn matches(&self, record: &ChangeRecord) -> bool {
        if let Some(otu_id) = &self.otu_id {
            if &record.otu.id != otu_id {
                return false;
            }
        }
        if let Some(reference_id) = &self.reference_id {
            if &record.reference.id != reference_id {
                return false;
            }
        }
        true
    }
}

/// A user and the number of changes they contributed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contributor {
    pub id: String,
    pub count: u64,
}

/// The append-only store of immutable change records.
///
/// Records are keyed by their composite id and totally ordered per OTU by
/// `otu.version`, with the removal marker greatest.
#[async_trait]
pub trait ChangeStore: Send + Sync {
    /// Appends a new record.
    ///
    /// Fails with [`StoreError::DuplicateId`] if a record with the same id
    /// already exists; upstream versioning is monotonic, so this is an
    /// invariant violation rather than an expected outcome.
    async fn insert(&self, record: ChangeRecord) -> StoreResult<ChangeId>;

    /// Point lookup by id. Returns `None` if the record does not exist.
    async fn get(&self, id: &ChangeId) -> StoreResult<Option<ChangeRecord>>;

    /// Streams the records of one OTU ordered by version descending.
    ///
    /// Restartable and finite per OTU; the stream is lazy so a caller can
    /// stop consuming as soon as a stop condition holds.
    fn scan_descending(&self, otu_id: &OtuId) -> BoxStream<'_, StoreResult<ChangeRecord>>;

    /// Best-effort batch delete. Returns the number of records removed.
    async fn delete_many(&self, ids: &[ChangeId]) -> StoreResult<u64>;

    /// Groups the changes matching `filter` by user and counts them.
    async fn count_by_user(&self, filter: &ChangeFilter) -> StoreResult<Vec<Contributor>>;
}

/// In-memory change log backed by a `tokio` `RwLock`.
///
/// Single-document atomicity only, like the remote document stores this
/// stands in for.
#[derive(Default)]
pub struct MemoryChangeStore {
    records: RwLock<HashMap<ChangeId, ChangeRecord>>,
}

impl MemoryChangeStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records across all OTUs.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// True if the log holds no records.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl ChangeStore for MemoryChangeStore {
    async fn insert(&self, record: ChangeRecord) -> StoreResult<ChangeId> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.id) {
            return Err(StoreError::DuplicateId(record.id));
        }
        let id = record.id.clone();
        records.insert(id.clone(), record);
        Ok(id)
    }

    async fn get(&self, id: &ChangeId) -> StoreResult<Option<ChangeRecord>> {
        Ok(self.records.read().await.get(id).cloned())
    }

    fn scan_descending(&self, otu_id: &OtuId) -> BoxStream<'_, StoreResult<ChangeRecord>> {
        let otu_id = otu_id.clone();
        stream::once(async move {
            let records = self.records.read().await;
            let mut matching: Vec<ChangeRecord> = records
                .values()
                .filter(|record| record.otu.id == otu_id)
                .cloned()
                .collect();
            matching.sort_by(|a, b| b.otu.version.cmp(&a.otu.version));
            stream::iter(matching.into_iter().map(Ok))
        })
        .flatten()
        .boxed()
    }

    async fn delete_many(&self, ids: &[ChangeId]) -> StoreResult<u64> {
        let mut records = self.records.write().await;
        let mut removed = 0;
        for id in ids {
            if records.remove(id).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn count_by_user(&self, filter: &ChangeFilter) -> StoreResult<Vec<Contributor>> {
        let records = self.records.read().await;
        let mut counts: HashMap<String, u64> = HashMap::new();

        for record in records.values().filter(|record| filter.matches(record)) {
            *counts.entry(record.user.id.clone()).or_default() += 1;
        }

        let mut contributors: Vec<Contributor> = counts
            .into_iter()
            .map(|(id, count)| Contributor { id, count })
            .collect();
        contributors.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(contributors)
    }
}
