//! Structural diff codec for nested JSON documents.
//!
//! Computes a [`Delta`] (an edit list of added, removed, and changed nodes)
//! between two `serde_json::Value` trees, and applies or inverts such deltas
//! to reconstruct either side:
//!
//! - [`diff`] produces the delta transforming `old` into `new`
//! - [`apply`] replays a delta against a document
//! - [`Delta::invert`] produces the delta for the opposite direction without
//!   needing either original document
//!
//! For all documents `a` and `b`:
//! `apply(&diff(&a, &b), a) == b` and `apply(&diff(&a, &b).invert(), b) == a`.
//!
//! Deltas operate over typed trees (mappings, sequences, scalars), not text.
//! Applying a delta to a document it was not computed against fails with
//! [`DiffError::MalformedDiff`] when the document's structure does not line
//! up; a `Change` op whose target holds an unexpected scalar overwrites it.

mod delta;
mod diff;
mod error;
mod patch;

pub use delta::{Delta, DeltaOp, Entry, Segment};
pub use diff::diff;
pub use error::{DiffError, DiffResult};
pub use patch::apply;
