//! The live OTU collections: root documents and child sequence documents.
//!
//! Sequence documents are flat: each carries an `otu_id` field linking it to
//! its owner and an `isolate_id` field placing it within the OTU's isolates.
//! The splitter in the history crate moves sequences between this flat form
//! and the joined document shape.

use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use otulog_types::OtuId;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// The live store of OTU root documents and their sequences.
///
/// Writes are atomic per document only; callers sequencing multi-document
/// updates get no transaction from this interface.
#[async_trait]
pub trait OtuStore: Send + Sync {
    /// Fetches the root document for `otu_id`, if the OTU exists.
    async fn get_otu(&self, otu_id: &OtuId) -> StoreResult<Option<Value>>;

    /// Replaces the root document, inserting it if absent.
    async fn replace_otu(&self, otu_id: &OtuId, document: Value) -> StoreResult<()>;

    /// Deletes the root document. Returns true if it existed.
    async fn delete_otu(&self, otu_id: &OtuId) -> StoreResult<bool>;

    /// Fetches all sequence documents whose `otu_id` field matches.
    async fn sequences_for_otu(&self, otu_id: &OtuId) -> StoreResult<Vec<Value>>;

    /// Inserts one sequence document. The document must carry an `otu_id`
    /// field.
    async fn insert_sequence(&self, document: Value) -> StoreResult<()>;

    /// Deletes every sequence document belonging to `otu_id`. Returns the
    /// number removed.
    async fn delete_sequences_for_otu(&self, otu_id: &OtuId) -> StoreResult<u64>;
}

/// In-memory OTU store.
#[derive(Default)]
pub struct MemoryOtuStore {
    otus: RwLock<HashMap<OtuId, Value>>,
    sequences: RwLock<HashMap<OtuId, Vec<Value>>>,
}

impl MemoryOtuStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of OTU root documents.
    pub async fn otu_count(&self) -> usize {
        self.otus.read().await.len()
    }
}

#[async_trait]
impl OtuStore for MemoryOtuStore {
    async fn get_otu(&self, otu_id: &OtuId) -> StoreResult<Option<Value>> {
        Ok(self.otus.read().await.get(otu_id).cloned())
    }

    async fn replace_otu(&self, otu_id: &OtuId, document: Value) -> StoreResult<()> {
        self.otus.write().await.insert(otu_id.clone(), document);
        Ok(())
    }

    async fn delete_otu(&self, otu_id: &OtuId) -> StoreResult<bool> {
        Ok(self.otus.write().await.remove(otu_id).is_some())
    }

    async fn sequences_for_otu(&self, otu_id: &OtuId) -> StoreResult<Vec<Value>> {
        Ok(self
            .sequences
            .read()
            .await
            .get(otu_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn insert_sequence(&self, document: Value) -> StoreResult<()> {
        let otu_id = document
            .get("otu_id")
            .and_then(Value::as_str)
            .map(OtuId::from)
            .ok_or_else(|| StoreError::Backend("sequence document missing otu_id".to_string()))?;

        self.sequences
            .write()
            .await
            .entry(otu_id)
            .or_default()
            .push(document);
        Ok(())
    }

    async fn delete_sequences_for_otu(&self, otu_id: &OtuId) -> StoreResult<u64> {
        let removed = self
            .sequences
            .write()
            .await
            .remove(otu_id)
            .map_or(0, |sequences| sequences.len() as u64);
        Ok(removed)
    }
}
