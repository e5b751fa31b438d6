//! Promise objects.
//!
//! A promise is an ordinary object whose internal slot holds a
//! [`PromiseRecord`]. [`JsPromise`] pairs the object with its record so the
//! rest of the runtime never has to downcast twice.

use crate::job_queue::{Job, QueueType};
use crate::reaction::PromiseReaction;
use crate::realm::Realm;
use crate::rejection::RejectionOperation;
use core_types::{JsObject, Value};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use tracing::debug;

/// The state of a Promise.
///
/// Once settled (Fulfilled or Rejected), a Promise cannot change state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromiseState {
    /// The initial state; the promise is neither fulfilled nor rejected.
    Pending,
    /// The promise has been resolved with a value.
    Fulfilled,
    /// The promise has been rejected with a reason.
    Rejected,
}

struct PromiseSlots {
    state: PromiseState,
    result: Value,
    fulfill_reactions: Vec<PromiseReaction>,
    reject_reactions: Vec<PromiseReaction>,
    is_handled: bool,
}

/// Internal slots of a promise object.
pub struct PromiseRecord(RefCell<PromiseSlots>);

impl PromiseRecord {
    fn new() -> Self {
        Self(RefCell::new(PromiseSlots {
            state: PromiseState::Pending,
            result: Value::Undefined,
            fulfill_reactions: Vec::new(),
            reject_reactions: Vec::new(),
            is_handled: false,
        }))
    }
}

/// A promise object together with its internal slots.
///
/// # Examples
///
/// ```
/// use async_runtime::{JsPromise, PromiseState, Realm};
/// use core_types::Value;
///
/// let realm = Realm::new();
/// let promise = JsPromise::create(&realm.promise_prototype());
/// assert_eq!(promise.state(), PromiseState::Pending);
///
/// promise.fulfill(&realm, Value::Smi(42));
/// assert_eq!(promise.state(), PromiseState::Fulfilled);
/// assert_eq!(promise.result(), Value::Smi(42));
/// ```
#[derive(Clone)]
pub struct JsPromise {
    object: JsObject,
    record: Rc<PromiseRecord>,
}

impl JsPromise {
    /// Allocates a pending promise inheriting from `prototype`.
    pub fn create(prototype: &JsObject) -> Self {
        let record = Rc::new(PromiseRecord::new());
        let object = JsObject::with_internal_slot(Some(prototype.clone()), record.clone());
        Self { object, record }
    }

    /// IsPromise on an object.
    pub fn from_object(object: &JsObject) -> Option<Self> {
        object.internal_slot::<PromiseRecord>().map(|record| Self {
            object: object.clone(),
            record,
        })
    }

    /// IsPromise on a value.
    pub fn from_value(value: &Value) -> Option<Self> {
        value.as_object().and_then(Self::from_object)
    }

    /// The promise object.
    pub fn object(&self) -> &JsObject {
        &self.object
    }

    /// The promise object as a value.
    pub fn to_value(&self) -> Value {
        Value::Object(self.object.clone())
    }

    /// `[[PromiseState]]`
    pub fn state(&self) -> PromiseState {
        self.record.0.borrow().state
    }

    /// `[[PromiseResult]]`; `undefined` while pending.
    pub fn result(&self) -> Value {
        self.record.0.borrow().result.clone()
    }

    /// `[[PromiseIsHandled]]`
    pub fn is_handled(&self) -> bool {
        self.record.0.borrow().is_handled
    }

    /// Sets `[[PromiseIsHandled]]`.
    pub fn set_handled(&self, handled: bool) {
        self.record.0.borrow_mut().is_handled = handled;
    }

    /// Number of reactions waiting on this promise (fulfill side).
    pub fn pending_reaction_count(&self) -> usize {
        self.record.0.borrow().fulfill_reactions.len()
    }

    pub(crate) fn append_reactions(&self, fulfill: PromiseReaction, reject: PromiseReaction) {
        let mut slots = self.record.0.borrow_mut();
        slots.fulfill_reactions.push(fulfill);
        slots.reject_reactions.push(reject);
    }

    /// Transitions a pending promise to `state` and hands back the reactions
    /// that must now run. Settled promises are left untouched.
    fn settle(&self, state: PromiseState, result: Value) -> Option<Vec<PromiseReaction>> {
        let mut slots = self.record.0.borrow_mut();
        if slots.state != PromiseState::Pending {
            return None;
        }
        slots.state = state;
        slots.result = result;
        let fulfill = std::mem::take(&mut slots.fulfill_reactions);
        let reject = std::mem::take(&mut slots.reject_reactions);
        Some(match state {
            PromiseState::Rejected => reject,
            _ => fulfill,
        })
    }

    /// FulfillPromise.
    pub fn fulfill(&self, realm: &Realm, value: Value) {
        if let Some(reactions) = self.settle(PromiseState::Fulfilled, value.clone()) {
            debug!(reactions = reactions.len(), "promise fulfilled");
            Self::trigger_reactions(realm, reactions, &value);
        }
    }

    /// RejectPromise. Notifies the rejection tracker when nothing handles it.
    pub fn reject(&self, realm: &Realm, reason: Value) {
        if let Some(reactions) = self.settle(PromiseState::Rejected, reason.clone()) {
            debug!(reactions = reactions.len(), "promise rejected");
            if !self.is_handled() {
                realm.track_rejection(self, RejectionOperation::Reject);
            }
            Self::trigger_reactions(realm, reactions, &reason);
        }
    }

    /// TriggerPromiseReactions: one job per reaction, in attachment order.
    pub fn trigger_reactions(realm: &Realm, reactions: Vec<PromiseReaction>, argument: &Value) {
        for reaction in reactions {
            realm.enqueue_job(
                QueueType::Promise,
                Job::PromiseReaction {
                    reaction,
                    argument: argument.clone(),
                },
            );
        }
    }
}

impl PartialEq for JsPromise {
    fn eq(&self, other: &Self) -> bool {
        self.object.ptr_eq(&other.object)
    }
}

impl fmt::Debug for JsPromise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.record.0.try_borrow() {
            Ok(slots) => f
                .debug_struct("JsPromise")
                .field("state", &slots.state)
                .field("result", &slots.result)
                .field("is_handled", &slots.is_handled)
                .finish(),
            Err(_) => write!(f, "JsPromise(<borrowed>)"),
        }
    }
}
