//! Error types for the diff codec.

use thiserror::Error;

/// Result type for diff operations.
pub type DiffResult<T> = Result<T, DiffError>;

/// Errors that can occur when applying a delta.
#[derive(Debug, Error)]
pub enum DiffError {
    /// The delta does not fit the document it is being applied to.
    #[error("malformed diff: {0}")]
    MalformedDiff(String),
}

impl DiffError {
    /// Builds a malformed-diff error with a formatted reason.
    #[must_use]
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedDiff(reason.into())
    }
}
