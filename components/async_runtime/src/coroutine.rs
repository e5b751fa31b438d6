//! The suspend/resume contract between the async driver and whatever executes
//! function bodies.

use crate::realm::Realm;
use core_types::{JsResult, Value};

/// How a suspended body is resumed.
#[derive(Debug, Clone, PartialEq)]
pub enum ResumeCompletion {
    /// Continue normally; the pending `await` evaluates to the value.
    Normal(Value),
    /// Continue by throwing the value at the pending `await`.
    Throw(Value),
}

/// Where a body stopped after being resumed.
#[derive(Debug, Clone, PartialEq)]
pub enum CoroutineStep {
    /// Suspended on `await value`.
    Await(Value),
    /// Returned `value`.
    Complete(Value),
}

/// A resumable function body.
///
/// The first resume of a fresh body always receives
/// `ResumeCompletion::Normal(Value::Undefined)`. Returning `Err` means the
/// body threw and did not catch it.
pub trait Coroutine {
    /// Runs the body until its next `await` or its end.
    fn resume(&mut self, realm: &Realm, completion: ResumeCompletion) -> JsResult<CoroutineStep>;
}

impl<F> Coroutine for F
where
    F: FnMut(&Realm, ResumeCompletion) -> JsResult<CoroutineStep>,
{
    fn resume(&mut self, realm: &Realm, completion: ResumeCompletion) -> JsResult<CoroutineStep> {
        self(realm, completion)
    }
}
