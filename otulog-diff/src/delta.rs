//! The delta model: an edit list over nested JSON documents.
//!
//! Every op addresses a node by path from the document root. Add and remove
//! ops carry the affected entries (key and value) so that a delta can be
//! inverted without access to either original document: inversion swaps adds
//! with removes and the two sides of a change.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// One step of a path into a nested document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Segment {
    /// A mapping key.
    Key(String),
    /// A sequence position.
    Index(usize),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(k) => write!(f, "{k}"),
            Self::Index(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for Segment {
    fn from(s: &str) -> Self {
        Self::Key(s.to_string())
    }
}

impl From<usize> for Segment {
    fn from(i: usize) -> Self {
        Self::Index(i)
    }
}

/// An entry added to or removed from a container: the key (or position)
/// together with the value at that slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Mapping key or sequence position within the container.
    pub key: Segment,
    /// The value occupying that slot.
    pub value: Value,
}

impl Entry {
    /// Creates an entry.
    #[must_use]
    pub fn new(key: impl Into<Segment>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// A single edit.
///
/// `Add` and `Remove` address the *container* and list the entries involved;
/// `Change` addresses the changed node itself. Sequence entries in an `Add`
/// are ordered by ascending position; `Remove` entries are likewise stored
/// ascending and applied in reverse so earlier removals do not shift later
/// positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum DeltaOp {
    /// Entries inserted into the container at `path`.
    Add { path: Vec<Segment>, entries: Vec<Entry> },
    /// Entries removed from the container at `path`.
    Remove { path: Vec<Segment>, entries: Vec<Entry> },
    /// The node at `path` changed from `old` to `new`.
    Change {
        path: Vec<Segment>,
        old: Value,
        new: Value,
    },
}

impl DeltaOp {
    /// Returns the inverse edit.
    #[must_use]
    pub fn invert(&self) -> Self {
        match self {
            Self::Add { path, entries } => Self::Remove {
                path: path.clone(),
                entries: entries.clone(),
            },
            Self::Remove { path, entries } => Self::Add {
                path: path.clone(),
                entries: entries.clone(),
            },
            Self::Change { path, old, new } => Self::Change {
                path: path.clone(),
                old: new.clone(),
                new: old.clone(),
            },
        }
    }
}

/// An ordered edit list transforming one document into another.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Delta(pub Vec<DeltaOp>);

impl Delta {
    /// Creates an empty delta.
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Returns true if the delta contains no edits.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of edits in the delta.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the delta transforming the documents in the opposite
    /// direction. Ops are kept in order; each op is independently invertible
    /// because add/remove carry their entries.
    #[must_use]
    pub fn invert(&self) -> Self {
        Self(self.0.iter().map(DeltaOp::invert).collect())
    }

    /// Iterates over the edits.
    pub fn iter(&self) -> std::slice::Iter<'_, DeltaOp> {
        self.0.iter()
    }
}

impl IntoIterator for Delta {
    type Item = DeltaOp;
    type IntoIter = std::vec::IntoIter<DeltaOp>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl FromIterator<DeltaOp> for Delta {
    fn from_iter<I: IntoIterator<Item = DeltaOp>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
