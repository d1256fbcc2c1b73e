//! Change notification capability.
//!
//! After a successful commit the engine signals "this OTU changed" so
//! connected clients can refresh. The backend is injected; the engine never
//! lets a notification failure fail the commit that triggered it.

use async_trait::async_trait;
use otulog_types::OtuId;
use thiserror::Error;

/// Error from a notification backend.
#[derive(Debug, Error)]
#[error("notification failed: {0}")]
pub struct NotifyError(String);

impl NotifyError {
    /// Creates an error with the given reason.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// A narrow capability for announcing that an OTU changed.
#[async_trait]
pub trait ChangeNotifier: Send + Sync {
    /// Signals that the OTU identified by `otu_id` changed.
    async fn notify_change(&self, otu_id: &OtuId) -> Result<(), NotifyError>;
}

/// A notifier that drops every signal. The default when no backend is
/// wired.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

#[async_trait]
impl ChangeNotifier for NullNotifier {
    async fn notify_change(&self, _otu_id: &OtuId) -> Result<(), NotifyError> {
        Ok(())
    }
}
