//! Reconstructing historical OTU states.
//!
//! The engine walks an OTU's change records newest-first, undoing each one
//! against an accumulator that starts as the live joined document:
//!
//! - undoing a `remove` makes the tombstone snapshot the current state
//! - undoing a `create` makes the state absent (the OTU did not exist yet)
//! - undoing a `modify` applies the record's inverted delta
//!
//! A [`StopCondition`] decides where the walk ends, before or after a
//! record is consumed. The two policies cover the engine's read paths:
//! rewinding to a target version and rewinding to the newest verified
//! state.

use crate::error::{HistoryError, HistoryResult};
use futures::StreamExt;
use otulog_diff::apply;
use otulog_storage::{ChangeStore, DiffStore};
use otulog_types::{ChangeDiff, ChangeId, ChangeMethod, ChangeRecord, OtuId, OtuVersion};
use serde_json::Value;
use tracing::debug;

/// Where a replay stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopCondition {
    /// Stop before consuming the record at or below the bound, leaving the
    /// accumulator at the bound version. `None` rewinds past the OTU's
    /// creation: the result is the absent state.
    ///
    /// Removal records sort above every finite version and are always
    /// consumed.
    ToVersion(Option<u64>),

    /// Stop after the accumulator becomes a document whose `verified` flag
    /// is true. If the walk consumes the creation record first, no verified
    /// state exists and the result is absent.
    UntilVerified,
}

impl StopCondition {
    fn stops_before(&self, record: &ChangeRecord) -> bool {
        match self {
            Self::ToVersion(bound) => match (record.otu.version, bound) {
                (OtuVersion::Finite(version), Some(bound)) => version <= *bound,
                (OtuVersion::Finite(_), None) => false,
                (OtuVersion::Removed, _) => false,
            },
            Self::UntilVerified => false,
        }
    }

    fn stops_after(&self, state: Option<&Value>) -> bool {
        match self {
            Self::ToVersion(_) => false,
            Self::UntilVerified => state.is_some_and(is_verified),
        }
    }
}

/// True if the document's `verified` flag is set.
pub(crate) fn is_verified(doc: &Value) -> bool {
    doc.get("verified").and_then(Value::as_bool).unwrap_or(false)
}

/// The result of a replay: the reconstructed state (absent when the walk
/// crossed the OTU's creation) and the ids of the records undone to reach
/// it, newest first.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayOutcome {
    /// The reconstructed historical document.
    pub state: Option<Value>,
    /// The change records consumed, in traversal order.
    pub traversed: Vec<ChangeId>,
}

/// Replays inverse diffs over `current` until `stop` holds.
///
/// Strictly sequential: each step depends on the accumulator the previous
/// step produced. An OTU with no change records yields the current state
/// untouched.
pub(crate) async fn replay(
    changes: &dyn ChangeStore,
    diffs: &dyn DiffStore,
    otu_id: &OtuId,
    current: Option<Value>,
    stop: StopCondition,
) -> HistoryResult<ReplayOutcome> {
    let mut state = current;
    let mut traversed = Vec::new();

    let mut scan = changes.scan_descending(otu_id);

    while let Some(record) = scan.next().await {
        let record = record?;

        if stop.stops_before(&record) {
            break;
        }

        debug!(change_id = %record.id, method = %record.method, "undoing change");
        traversed.push(record.id.clone());

        state = match record.method {
            ChangeMethod::Remove => Some(tombstone(&record)?),
            ChangeMethod::Create => None,
            ChangeMethod::Modify => {
                let delta = resolve_delta(diffs, &record).await?;
                let base = state.ok_or_else(|| {
                    HistoryError::InvalidChange(format!(
                        "modify record {} has no base state to undo against",
                        record.id
                    ))
                })?;
                Some(apply(&delta.invert(), base)?)
            }
        };

        if stop.stops_after(state.as_ref()) {
            break;
        }
    }

    Ok(ReplayOutcome { state, traversed })
}

fn tombstone(record: &ChangeRecord) -> HistoryResult<Value> {
    record
        .diff
        .as_snapshot()
        .cloned()
        .ok_or_else(|| {
            HistoryError::InvalidChange(format!(
                "remove record {} does not carry a snapshot",
                record.id
            ))
        })
}

/// Returns the record's delta, loading it from blob storage when the record
/// carries the offload marker.
pub(crate) async fn resolve_delta(
    diffs: &dyn DiffStore,
    record: &ChangeRecord,
) -> HistoryResult<otulog_diff::Delta> {
    match &record.diff {
        ChangeDiff::Delta(delta) => Ok(delta.clone()),
        ChangeDiff::Indirect(_) => {
            let (otu_id, version) = record.id.parse()?;
            Ok(diffs.read_diff(&otu_id, version).await?)
        }
        ChangeDiff::Snapshot(_) => Err(HistoryError::InvalidChange(format!(
            "modify record {} carries a snapshot instead of a delta",
            record.id
        ))),
    }
}
