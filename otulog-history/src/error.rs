//! Error types for the history engine.

use otulog_diff::DiffError;
use otulog_storage::StoreError;
use otulog_types::{ChangeId, ChangeIdError};
use thiserror::Error;

/// Result type for history operations.
pub type HistoryResult<T> = Result<T, HistoryError>;

/// Errors that can occur in history operations.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// A referenced change record does not exist.
    #[error("change not found: {0}")]
    NotFound(ChangeId),

    /// The operation conflicts with the record's state; reverting a change
    /// already included in an index build, for example.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The inputs or the log contents violate an engine invariant.
    #[error("invalid change: {0}")]
    InvalidChange(String),

    /// A malformed change id.
    #[error("change id error: {0}")]
    ChangeId(#[from] ChangeIdError),

    /// A delta could not be applied to its base document.
    #[error("diff error: {0}")]
    Diff(#[from] DiffError),

    /// A storage operation failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
