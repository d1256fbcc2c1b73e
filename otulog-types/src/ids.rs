//! Identifier types used throughout the otulog engine.
//!
//! OTU ids are short random alphanumeric strings assigned when a record is
//! first created. They are plain strings on the wire and in storage.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Length of generated OTU ids.
const OTU_ID_LEN: usize = 8;

/// Unique identifier for an OTU (operational taxonomic unit).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OtuId(String);

impl OtuId {
    /// Generates a new random 8-character alphanumeric id.
    #[must_use]
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let id = (0..OTU_ID_LEN)
            .map(|_| {
                let c = rng.gen_range(0..36u32);
                char::from_digit(c, 36).unwrap_or('0')
            })
            .collect();
        Self(id)
    }

    /// Wraps an existing id string.
    #[must_use]
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OtuId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for OtuId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<&str> for OtuId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for OtuId {
    fn from(s: String) -> Self {
        Self(s)
    }
}
