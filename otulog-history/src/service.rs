//! The history service: commit, lookup, replay, and revert.

use crate::config::HistoryConfig;
use crate::error::{HistoryError, HistoryResult};
use crate::notify::{ChangeNotifier, NullNotifier};
use crate::otu::{merge_otu, split_otu};
use crate::replay::{self, is_verified, ReplayOutcome, StopCondition};
use chrono::Utc;
use futures::StreamExt;
use otulog_diff::diff;
use otulog_storage::{ChangeFilter, ChangeStore, Contributor, DiffStore, OtuStore};
use otulog_types::{
    ChangeDiff, ChangeId, ChangeMethod, ChangeRecord, IndexRef, OtuId, OtuRef, OtuVersion,
    ReferenceRef, UserRef,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The history engine.
///
/// Wires the change log, the live OTU collections, the diff blob store, and
/// the change notifier. The engine performs no locking; callers are
/// responsible for serializing writers per OTU. Independent OTUs may be
/// processed concurrently.
pub struct History {
    changes: Arc<dyn ChangeStore>,
    otus: Arc<dyn OtuStore>,
    diffs: Arc<dyn DiffStore>,
    notifier: Arc<dyn ChangeNotifier>,
    config: HistoryConfig,
}

impl History {
    /// Creates a history engine with the default config and no notification
    /// backend.
    #[must_use]
    pub fn new(
        changes: Arc<dyn ChangeStore>,
        otus: Arc<dyn OtuStore>,
        diffs: Arc<dyn DiffStore>,
    ) -> Self {
        Self {
            changes,
            otus,
            diffs,
            notifier: Arc::new(NullNotifier),
            config: HistoryConfig::default(),
        }
    }

    /// Sets the notification backend.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn ChangeNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Sets the engine configuration.
    #[must_use]
    pub fn with_config(mut self, config: HistoryConfig) -> Self {
        self.config = config;
        self
    }

    // ── Commit ──────────────────────────────────────────────────

    /// Records a state transition in the change log.
    ///
    /// `old` is the joined document before the change and `new` the joined
    /// document after it; `create` has no `old`, `remove` no `new`. The
    /// record's diff is a snapshot for `create`/`remove` and a structural
    /// delta for `modify`, offloaded to blob storage when it exceeds the
    /// configured threshold.
    ///
    /// A successful commit signals the notifier unless `silent` is set;
    /// notification failures are logged and never fail the commit.
    pub async fn commit(
        &self,
        method: ChangeMethod,
        old: Option<&Value>,
        new: Option<&Value>,
        description: impl Into<String>,
        user_id: impl Into<String>,
        silent: bool,
    ) -> HistoryResult<ChangeRecord> {
        let otu_id = string_field(old, new, "id")
            .map(OtuId::from)
            .ok_or_else(|| HistoryError::InvalidChange("no id on either document".to_string()))?;
        let name = string_field(old, new, "name")
            .ok_or_else(|| HistoryError::InvalidChange("no name on either document".to_string()))?;
        let reference_id = reference_field(old, new).ok_or_else(|| {
            HistoryError::InvalidChange("no reference id on either document".to_string())
        })?;

        let version = match method {
            ChangeMethod::Remove => OtuVersion::Removed,
            ChangeMethod::Create | ChangeMethod::Modify => new
                .and_then(|doc| doc.get("version"))
                .and_then(Value::as_u64)
                .map(OtuVersion::Finite)
                .ok_or_else(|| {
                    HistoryError::InvalidChange(
                        "new document has no integer version".to_string(),
                    )
                })?,
        };

        let change_diff = self
            .build_diff(method, old, new, &otu_id, version)
            .await?;

        let record = ChangeRecord {
            id: ChangeId::new(&otu_id, version),
            method,
            otu: OtuRef {
                id: otu_id.clone(),
                name,
                version,
            },
            reference: ReferenceRef { id: reference_id },
            index: IndexRef::unbuilt(),
            diff: change_diff,
            description: description.into(),
            created_at: Utc::now(),
            user: UserRef { id: user_id.into() },
        };

        self.changes.insert(record.clone()).await?;
        debug!(change_id = %record.id, method = %method, "committed change");

        if !silent {
            if let Err(err) = self.notifier.notify_change(&otu_id).await {
                warn!(otu_id = %otu_id, error = %err, "change notification failed");
            }
        }

        Ok(record)
    }

    async fn build_diff(
        &self,
        method: ChangeMethod,
        old: Option<&Value>,
        new: Option<&Value>,
        otu_id: &OtuId,
        version: OtuVersion,
    ) -> HistoryResult<ChangeDiff> {
        match method {
            ChangeMethod::Create => {
                let new = new.ok_or_else(|| {
                    HistoryError::InvalidChange("create without a new document".to_string())
                })?;
                Ok(ChangeDiff::Snapshot(new.clone()))
            }
            ChangeMethod::Remove => {
                let old = old.ok_or_else(|| {
                    HistoryError::InvalidChange("remove without an old document".to_string())
                })?;
                Ok(ChangeDiff::Snapshot(old.clone()))
            }
            ChangeMethod::Modify => {
                let (old, new) = match (old, new) {
                    (Some(old), Some(new)) => (old, new),
                    _ => {
                        return Err(HistoryError::InvalidChange(
                            "modify requires both documents".to_string(),
                        ));
                    }
                };

                let delta = diff(old, new);
                let encoded_len = serde_json::to_vec(&delta)
                    .map_err(otulog_storage::StoreError::from)?
                    .len();

                if encoded_len > self.config.diff_offload_threshold {
                    self.diffs.write_diff(otu_id, version, &delta).await?;
                    debug!(
                        otu_id = %otu_id,
                        %version,
                        bytes = encoded_len,
                        "offloaded oversized diff"
                    );
                    Ok(ChangeDiff::indirect())
                } else {
                    Ok(ChangeDiff::Delta(delta))
                }
            }
        }
    }

    // ── Lookup ──────────────────────────────────────────────────

    /// Fetches a change record by id, resolving an offloaded diff so the
    /// caller always sees the full delta.
    pub async fn get(&self, change_id: &ChangeId) -> HistoryResult<Option<ChangeRecord>> {
        let Some(mut record) = self.changes.get(change_id).await? else {
            return Ok(None);
        };

        if record.diff.is_indirect() {
            let delta = replay::resolve_delta(self.diffs.as_ref(), &record).await?;
            record.diff = ChangeDiff::Delta(delta);
        }

        Ok(Some(record))
    }

    /// Returns the newest change for an OTU that has not been included in
    /// an index build, if any.
    pub async fn most_recent_change(
        &self,
        otu_id: &OtuId,
    ) -> HistoryResult<Option<ChangeRecord>> {
        let mut scan = self.changes.scan_descending(otu_id);

        while let Some(record) = scan.next().await {
            let record = record?;
            if record.index.is_unbuilt() {
                return Ok(Some(record));
            }
        }

        Ok(None)
    }

    /// Groups the changes matching `filter` by user and counts them.
    pub async fn contributors(&self, filter: &ChangeFilter) -> HistoryResult<Vec<Contributor>> {
        Ok(self.changes.count_by_user(filter).await?)
    }

    /// Fetches the live joined document for an OTU: the root document with
    /// its sequences merged into their isolates.
    pub async fn join_otu(&self, otu_id: &OtuId) -> HistoryResult<Option<Value>> {
        let Some(root) = self.otus.get_otu(otu_id).await? else {
            return Ok(None);
        };
        let sequences = self.otus.sequences_for_otu(otu_id).await?;
        Ok(Some(merge_otu(root, sequences)))
    }

    // ── Replay ──────────────────────────────────────────────────

    /// Replays inverse diffs over `current` until `stop` holds, returning
    /// the reconstructed state and the record ids traversed.
    pub async fn replay(
        &self,
        otu_id: &OtuId,
        current: Option<Value>,
        stop: StopCondition,
    ) -> HistoryResult<ReplayOutcome> {
        replay::replay(
            self.changes.as_ref(),
            self.diffs.as_ref(),
            otu_id,
            current,
            stop,
        )
        .await
    }

    /// Takes a joined OTU back in time to `version`.
    ///
    /// Returns the current joined document, the patched historical
    /// document, and the ids of the changes undone to produce it. If the
    /// live document is already at `version` the replay is skipped
    /// entirely.
    pub async fn patch_to_version(
        &self,
        otu_id: &OtuId,
        version: u64,
    ) -> HistoryResult<(Option<Value>, Option<Value>, Vec<ChangeId>)> {
        let current = self.join_otu(otu_id).await?;

        if let Some(doc) = &current {
            if doc.get("version").and_then(Value::as_u64) == Some(version) {
                return Ok((current.clone(), current, Vec::new()));
            }
        }

        let outcome = self
            .replay(otu_id, current.clone(), StopCondition::ToVersion(Some(version)))
            .await?;

        Ok((current, outcome.state, outcome.traversed))
    }

    /// Walks back from the live document to the newest state whose
    /// `verified` flag is set. Returns `None` if no verified state ever
    /// existed.
    pub async fn patch_to_verified(&self, otu_id: &OtuId) -> HistoryResult<Option<Value>> {
        let current = self.join_otu(otu_id).await?;

        if let Some(doc) = &current {
            if is_verified(doc) {
                return Ok(current);
            }
        }

        let outcome = self
            .replay(otu_id, current, StopCondition::UntilVerified)
            .await?;

        Ok(outcome.state.filter(|doc| is_verified(doc)))
    }

    // ── Revert ──────────────────────────────────────────────────

    /// Undoes the change identified by `change_id` and every newer change
    /// of the same OTU, rewriting the live collections to the state that
    /// preceded it.
    ///
    /// Fails with [`HistoryError::Conflict`] before touching anything if
    /// the change has been included in an index build. Returns the restored
    /// joined document, or `None` when the revert undid the OTU's creation
    /// and the OTU no longer exists.
    ///
    /// The rewrite is sequenced best-effort: the backing store offers
    /// single-document atomicity only, so a failure partway can leave the
    /// collections inconsistent until an external repair pass runs.
    pub async fn revert(&self, change_id: &ChangeId) -> HistoryResult<Option<Value>> {
        let record = self
            .changes
            .get(change_id)
            .await?
            .ok_or_else(|| HistoryError::NotFound(change_id.clone()))?;

        // The guard must run before any mutation: a change baked into a
        // published index must never be silently unwound.
        if !record.is_revertible() {
            return Err(HistoryError::Conflict(
                "change is included in a build and not revertible".to_string(),
            ));
        }

        let (otu_id, version) = change_id.parse()?;
        let bound = match version {
            OtuVersion::Finite(0) => None,
            OtuVersion::Finite(version) => Some(version - 1),
            // Undoing a removal rewinds to the version the tombstone
            // recorded; the removal record itself sorts above it.
            OtuVersion::Removed => Some(tombstone_version(&record)?),
        };

        let current = self.join_otu(&otu_id).await?;
        let outcome = self
            .replay(&otu_id, current, StopCondition::ToVersion(bound))
            .await?;

        self.otus.delete_sequences_for_otu(&otu_id).await?;

        match &outcome.state {
            Some(patched) => {
                let (root, sequences) = split_otu(patched);
                for sequence in sequences {
                    self.otus.insert_sequence(sequence).await?;
                }
                self.otus.replace_otu(&otu_id, root).await?;
            }
            None => {
                self.otus.delete_otu(&otu_id).await?;
            }
        }

        let pruned = self.changes.delete_many(&outcome.traversed).await?;
        info!(
            otu_id = %otu_id,
            change_id = %change_id,
            pruned,
            restored = outcome.state.is_some(),
            "reverted change"
        );

        Ok(outcome.state)
    }
}

fn string_field(old: Option<&Value>, new: Option<&Value>, key: &str) -> Option<String> {
    old.or(new)
        .and_then(|doc| doc.get(key))
        .and_then(Value::as_str)
        .map(ToString::to_string)
}

fn reference_field(old: Option<&Value>, new: Option<&Value>) -> Option<String> {
    old.or(new)
        .and_then(|doc| doc.pointer("/reference/id"))
        .and_then(Value::as_str)
        .map(ToString::to_string)
}

fn tombstone_version(record: &ChangeRecord) -> HistoryResult<u64> {
    record
        .diff
        .as_snapshot()
        .and_then(|doc| doc.get("version"))
        .and_then(Value::as_u64)
        .ok_or_else(|| {
            HistoryError::InvalidChange(format!(
                "removal record {} has no tombstone version",
                record.id
            ))
        })
}
