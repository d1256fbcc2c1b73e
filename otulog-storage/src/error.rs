//! Error types for the storage layer.

use otulog_types::{ChangeId, OtuId, OtuVersion};
use thiserror::Error;

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A change record with this id already exists. Versioning upstream is
    /// monotonic, so a collision indicates an invariant violation.
    #[error("duplicate change id: {0}")]
    DuplicateId(ChangeId),

    /// A referenced document does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// An offloaded diff blob is missing. Fatal: the change log references
    /// content that no longer exists.
    #[error("missing diff blob for {otu_id} version {version}")]
    MissingDiff { otu_id: OtuId, version: OtuVersion },

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error (file system).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Backend-specific failure.
    #[error("storage backend error: {0}")]
    Backend(String),
}
