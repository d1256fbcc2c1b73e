//! The otulog history engine.
//!
//! Versions OTU documents with an append-only log of structural diffs. Every
//! commit records a [`otulog_types::ChangeRecord`] holding the delta between
//! the old and new joined states (or a full snapshot for creations and
//! removals). Any prior version can be reconstructed by replaying inverted
//! deltas backward from the live document, and the most recent unbuilt
//! changes can be undone transactionally.
//!
//! The entry point is [`History`], wired with a change store, the live OTU
//! store, a diff blob store, and an optional change notifier:
//!
//! - [`History::commit`] appends a change record for a state transition
//! - [`History::patch_to_version`] reconstructs a historical state
//! - [`History::patch_to_verified`] walks back to the newest verified state
//! - [`History::revert`] undoes a change and everything after it, rewriting
//!   the live collections
//!
//! Changes that an external indexer has associated with a build are
//! permanently pinned; reverting them fails with
//! [`HistoryError::Conflict`] before any mutation.

mod config;
mod error;
mod notify;
mod otu;
mod replay;
mod service;

pub use config::HistoryConfig;
pub use error::{HistoryError, HistoryResult};
pub use notify::{ChangeNotifier, NotifyError, NullNotifier};
pub use otu::{extract_isolate_ids, extract_sequence_ids, find_isolate, merge_otu, split_otu};
pub use replay::{ReplayOutcome, StopCondition};
pub use service::History;
