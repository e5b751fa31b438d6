//! Host-facing runtime errors.

use core_types::Exception;

/// Errors surfaced to the embedder while driving a realm.
///
/// Exceptions thrown inside promise jobs never reach this type: they are
/// routed into rejections. Only host and script jobs, tasks, configuration and
/// lifecycle problems produce a `RuntimeError`.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// A host task or script job completed abruptly.
    #[error("{0}")]
    UncaughtException(Exception),

    /// The configured per-drain job budget ran out.
    #[error("job budget of {budget} exhausted with {remaining} job(s) still queued")]
    JobBudgetExceeded {
        /// Configured budget
        budget: usize,
        /// Jobs left in the queues
        remaining: usize,
    },

    /// The realm was torn down and can no longer run jobs.
    #[error("realm has been torn down")]
    RealmTornDown,

    /// Configuration values out of range.
    #[error("invalid runtime configuration: {0}")]
    InvalidConfig(String),

    /// Configuration JSON could not be parsed or written.
    #[error("configuration JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The host inbox is full.
    #[error("host inbox is full")]
    HostInboxFull,

    /// The event loop owning the host inbox has been dropped.
    #[error("event loop is closed")]
    EventLoopClosed,
}

impl From<Exception> for RuntimeError {
    fn from(exception: Exception) -> Self {
        RuntimeError::UncaughtException(exception)
    }
}
