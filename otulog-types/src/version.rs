//! The OTU version type.
//!
//! Every change to an OTU increments an integer version. A deletion is
//! recorded with the `removed` marker, which orders after every finite
//! version: a removed OTU is beyond its newest known version. The marker
//! serializes as the literal string `"removed"`, finite versions as plain
//! JSON integers.

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

/// A version of an OTU document: a finite revision number, or the marker
/// left behind by a deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OtuVersion {
    /// A concrete revision number.
    Finite(u64),
    /// The OTU was deleted; sorts after every finite version.
    Removed,
}

impl OtuVersion {
    /// Returns the finite version number, if any.
    #[must_use]
    pub const fn as_finite(&self) -> Option<u64> {
        match self {
            Self::Finite(v) => Some(*v),
            Self::Removed => None,
        }
    }

    /// Returns true if this is the removal marker.
    #[must_use]
    pub const fn is_removed(&self) -> bool {
        matches!(self, Self::Removed)
    }
}

impl Ord for OtuVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Finite(a), Self::Finite(b)) => a.cmp(b),
            (Self::Removed, Self::Removed) => Ordering::Equal,
            (Self::Removed, Self::Finite(_)) => Ordering::Greater,
            (Self::Finite(_), Self::Removed) => Ordering::Less,
        }
    }
}

impl PartialOrd for OtuVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<u64> for OtuVersion {
    fn from(v: u64) -> Self {
        Self::Finite(v)
    }
}

impl fmt::Display for OtuVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Finite(v) => write!(f, "{v}"),
            Self::Removed => write!(f, "removed"),
        }
    }
}

impl Serialize for OtuVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Finite(v) => serializer.serialize_u64(*v),
            Self::Removed => serializer.serialize_str("removed"),
        }
    }
}

impl<'de> Deserialize<'de> for OtuVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct VersionVisitor;

        impl<'de> Visitor<'de> for VersionVisitor {
            type Value = OtuVersion;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-negative integer or the string \"removed\"")
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(OtuVersion::Finite(v))
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                u64::try_from(v)
                    .map(OtuVersion::Finite)
                    .map_err(|_| E::custom("negative version"))
            }

            fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                if s == "removed" {
                    Ok(OtuVersion::Removed)
                } else {
                    s.parse::<u64>()
                        .map(OtuVersion::Finite)
                        .map_err(|_| E::custom(format!("invalid version: {s}")))
                }
            }
        }

        deserializer.deserialize_any(VersionVisitor)
    }
}
