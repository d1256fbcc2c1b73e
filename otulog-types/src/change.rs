//! Change records: immutable log entries capturing one OTU state transition.
//!
//! A record's id is the composite `"<otu_id>.<version>"`, so ids are
//! globally unique as long as versions increase monotonically per OTU. The
//! `index` field starts at the `unbuilt` sentinel; an external indexer later
//! points it at the build that incorporated the change, which permanently
//! pins the record against reversion.

use crate::{OtuId, OtuVersion};
use chrono::{DateTime, Utc};
use otulog_diff::Delta;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Sentinel id/version for a change not yet included in any index build.
pub const UNBUILT: &str = "unbuilt";

/// Errors from parsing a composite change id.
#[derive(Debug, Error)]
pub enum ChangeIdError {
    /// The id has no `.` separator.
    #[error("invalid change id: {0}")]
    MissingSeparator(String),
    /// The version component is neither an integer nor `removed`.
    #[error("invalid version in change id: {0}")]
    InvalidVersion(String),
}

/// Unique identifier for a change record: `"<otu_id>.<version>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeId(String);

impl ChangeId {
    /// Builds the id for a change to `otu_id` producing `version`.
    #[must_use]
    pub fn new(otu_id: &OtuId, version: OtuVersion) -> Self {
        Self(format!("{otu_id}.{version}"))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Splits the id into its OTU id and version components.
    ///
    /// The split happens at the last `.`, so OTU ids containing dots still
    /// parse.
    pub fn parse(&self) -> Result<(OtuId, OtuVersion), ChangeIdError> {
        let (otu_id, version) = self
            .0
            .rsplit_once('.')
            .ok_or_else(|| ChangeIdError::MissingSeparator(self.0.clone()))?;

        let version = if version == "removed" {
            OtuVersion::Removed
        } else {
            version
                .parse::<u64>()
                .map(OtuVersion::Finite)
                .map_err(|_| ChangeIdError::InvalidVersion(self.0.clone()))?
        };

        Ok((OtuId::from_string(otu_id), version))
    }
}

impl fmt::Display for ChangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ChangeId {
    type Err = ChangeIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = Self(s.to_string());
        id.parse()?;
        Ok(id)
    }
}

/// The kind of state transition a change record documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeMethod {
    /// The OTU came into existence with this change.
    Create,
    /// An existing OTU was modified.
    Modify,
    /// The OTU was deleted.
    Remove,
}

impl fmt::Display for ChangeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Modify => write!(f, "modify"),
            Self::Remove => write!(f, "remove"),
        }
    }
}

/// The OTU a change applies to, as of that change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OtuRef {
    pub id: OtuId,
    pub name: String,
    pub version: OtuVersion,
}

/// The reference (owning namespace) an OTU belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceRef {
    pub id: String,
}

/// The user that made a change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: String,
}

/// The index build a change has been incorporated into, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRef {
    pub id: String,
    pub version: String,
}

impl IndexRef {
    /// The sentinel for a change not yet included in a build.
    #[must_use]
    pub fn unbuilt() -> Self {
        Self {
            id: UNBUILT.to_string(),
            version: UNBUILT.to_string(),
        }
    }

    /// True while the change is not part of any build and may be reverted.
    #[must_use]
    pub fn is_unbuilt(&self) -> bool {
        self.id == UNBUILT && self.version == UNBUILT
    }
}

impl Default for IndexRef {
    fn default() -> Self {
        Self::unbuilt()
    }
}

/// The diff field of a change record.
///
/// Serialized without a tag; the three forms are distinguishable by shape:
/// the offload marker is the bare string `"file"`, a delta is an array of
/// tagged ops, and a snapshot is the document object itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChangeDiff {
    /// The delta was offloaded to blob storage; the marker string `"file"`.
    Indirect(IndirectMarker),
    /// An inline structural delta (method `modify`).
    Delta(Delta),
    /// A full document snapshot: the post-state for `create`, the pre-state
    /// tombstone for `remove`.
    Snapshot(Value),
}

impl ChangeDiff {
    /// The offload marker.
    #[must_use]
    pub fn indirect() -> Self {
        Self::Indirect(IndirectMarker)
    }

    /// True if the delta lives in external blob storage.
    #[must_use]
    pub fn is_indirect(&self) -> bool {
        matches!(self, Self::Indirect(_))
    }

    /// Returns the inline delta, if this is one.
    #[must_use]
    pub fn as_delta(&self) -> Option<&Delta> {
        match self {
            Self::Delta(delta) => Some(delta),
            _ => None,
        }
    }

    /// Returns the snapshot document, if this is one.
    #[must_use]
    pub fn as_snapshot(&self) -> Option<&Value> {
        match self {
            Self::Snapshot(doc) => Some(doc),
            _ => None,
        }
    }
}

/// Marker type serializing to the literal string `"file"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndirectMarker;

impl Serialize for IndirectMarker {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str("file")
    }
}

impl<'de> Deserialize<'de> for IndirectMarker {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        if s == "file" {
            Ok(Self)
        } else {
            Err(serde::de::Error::custom("expected the string \"file\""))
        }
    }
}

/// One immutable entry in an OTU's change log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Composite id: `"<otu_id>.<version>"`.
    pub id: ChangeId,

    /// The kind of transition.
    pub method: ChangeMethod,

    /// The OTU as of this change.
    pub otu: OtuRef,

    /// The reference the OTU belongs to.
    pub reference: ReferenceRef,

    /// Build association; `unbuilt` until an indexer claims the change.
    #[serde(default)]
    pub index: IndexRef,

    /// The structural diff, snapshot, or offload marker.
    pub diff: ChangeDiff,

    /// Human-readable description of the change.
    pub description: String,

    /// When the change was committed.
    pub created_at: DateTime<Utc>,

    /// Who made the change.
    pub user: UserRef,
}

impl ChangeRecord {
    /// True while the record may still be undone: it has not been
    /// incorporated into any index build.
    #[must_use]
    pub fn is_revertible(&self) -> bool {
        self.index.is_unbuilt()
    }
}
