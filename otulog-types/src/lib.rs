//! Core types for the otulog version-history engine.
//!
//! Defines the identifier newtypes, the ordered OTU version type, and the
//! change record model shared by the diff codec, the storage layer, and the
//! history service:
//! - [`OtuId`] / [`ChangeId`] — string identifiers (change ids are the
//!   composite `"<otu_id>.<version>"`)
//! - [`OtuVersion`] — a finite version number or the `removed` marker that
//!   sorts after every finite version
//! - [`ChangeRecord`] — one immutable log entry capturing a state transition
//! - [`ChangeDiff`] — the record's diff field: an inline delta, a full
//!   snapshot, or the `"file"` marker for an offloaded delta

mod change;
mod ids;
mod version;

pub use change::{
    ChangeDiff, ChangeId, ChangeIdError, ChangeMethod, ChangeRecord, IndexRef, IndirectMarker,
    OtuRef, ReferenceRef, UserRef, UNBUILT,
};
pub use ids::OtuId;
pub use version::OtuVersion;
