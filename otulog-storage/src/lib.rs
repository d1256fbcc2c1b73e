//! Store interfaces for the otulog engine.
//!
//! The engine talks to three collaborators, each behind an async trait:
//!
//! - [`ChangeStore`] — the append-only change log: point lookup, descending
//!   per-OTU scan, batch delete, per-user aggregation
//! - [`OtuStore`] — the live collections: OTU root documents and their
//!   child sequence documents
//! - [`DiffStore`] — write-once blob storage for deltas too large to inline
//!   in a log record
//!
//! The backing store is assumed to offer point lookups, descending range
//! scans, and atomic single-document writes, but no cross-document
//! transactions. In-memory implementations of all three traits are provided
//! for embedding and tests, plus a filesystem [`FsDiffStore`] matching the
//! original on-disk diff layout.

mod change_store;
mod diff_store;
mod error;
mod otu_store;

pub use change_store::{ChangeFilter, ChangeStore, Contributor, MemoryChangeStore};
pub use diff_store::{DiffStore, FsDiffStore, MemoryDiffStore};
pub use error::{StoreError, StoreResult};
pub use otu_store::{MemoryOtuStore, OtuStore};
