//! Host promise rejection tracking.

use crate::promise::JsPromise;
use std::rc::Rc;
use tracing::{debug, warn};

/// Operation reported to the rejection tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionOperation {
    /// A promise was rejected while no handler was attached.
    Reject,
    /// A handler was attached to a rejected promise that had none.
    Handle,
}

/// Host hook invoked for rejection bookkeeping.
pub type RejectionTracker = Rc<dyn Fn(&JsPromise, RejectionOperation)>;

/// Tracker used when the host installs none: reports through `tracing`.
pub fn log_rejection(promise: &JsPromise, operation: RejectionOperation) {
    match operation {
        RejectionOperation::Reject => {
            warn!(reason = %promise.result(), "promise rejected without a handler")
        }
        RejectionOperation::Handle => {
            debug!(reason = %promise.result(), "handler attached to rejected promise")
        }
    }
}
