//! Promise reactions and PerformPromiseThen.

use crate::capability::PromiseCapability;
use crate::job_queue::{Job, QueueType};
use crate::promise::{JsPromise, PromiseState};
use crate::realm::Realm;
use crate::rejection::RejectionOperation;
use core_types::{JsObject, Value};

/// Which settlement a reaction listens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionType {
    /// Runs on fulfillment
    Fulfill,
    /// Runs on rejection
    Reject,
}

/// What a reaction does with the settled value.
#[derive(Debug, Clone)]
pub enum ReactionHandler {
    /// Pass the value through to the downstream capability.
    Identity,
    /// Rethrow the value into the downstream capability.
    Thrower,
    /// Call a user handler.
    Callable(JsObject),
}

impl ReactionHandler {
    /// Picks the handler for a `then` argument: callables are kept, anything
    /// else becomes identity (fulfill side) or thrower (reject side).
    pub fn from_argument(argument: &Value, kind: ReactionType) -> Self {
        match argument {
            Value::Object(f) if f.is_callable() => ReactionHandler::Callable(f.clone()),
            _ => match kind {
                ReactionType::Fulfill => ReactionHandler::Identity,
                ReactionType::Reject => ReactionHandler::Thrower,
            },
        }
    }
}

/// A handler attached to a promise plus the capability it settles.
///
/// Which settlement it listens for is given by the list it sits in.
#[derive(Debug, Clone)]
pub struct PromiseReaction {
    /// Downstream capability
    pub capability: PromiseCapability,
    /// Handler to run
    pub handler: ReactionHandler,
}

/// PerformPromiseThen.
///
/// Pending promises queue the reaction pair; settled promises schedule the
/// matching reaction job at once. Returns the capability's promise.
pub fn perform_promise_then(
    realm: &Realm,
    promise: &JsPromise,
    on_fulfilled: &Value,
    on_rejected: &Value,
    capability: PromiseCapability,
) -> Value {
    let result_promise = capability.promise.clone();
    let fulfill = PromiseReaction {
        capability: capability.clone(),
        handler: ReactionHandler::from_argument(on_fulfilled, ReactionType::Fulfill),
    };
    let reject = PromiseReaction {
        capability,
        handler: ReactionHandler::from_argument(on_rejected, ReactionType::Reject),
    };
    match promise.state() {
        PromiseState::Pending => promise.append_reactions(fulfill, reject),
        PromiseState::Fulfilled => realm.enqueue_job(
            QueueType::Promise,
            Job::PromiseReaction {
                reaction: fulfill,
                argument: promise.result(),
            },
        ),
        PromiseState::Rejected => {
            if !promise.is_handled() {
                realm.track_rejection(promise, RejectionOperation::Handle);
            }
            realm.enqueue_job(
                QueueType::Promise,
                Job::PromiseReaction {
                    reaction: reject,
                    argument: promise.result(),
                },
            );
        }
    }
    promise.set_handled(true);
    result_promise
}
