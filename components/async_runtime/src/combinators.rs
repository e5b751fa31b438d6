//! `Promise.all`, `Promise.race`, `Promise.allSettled` and `Promise.any`.
//!
//! All four share one skeleton: resolve the constructor (`all` and `race`
//! honour `@@species`), create a capability, open the iterator and run the
//! per-element loop. `allSettled` and `any` read `C.resolve` once, before the
//! iterator is opened. Any throw after the capability exists is routed into its reject
//! function, closing the iterator first unless the iterator itself failed.

use crate::builtins::argument;
use crate::capability::{new_promise_capability, PromiseCapability};
use crate::iterator::{get_iterator, iterator_close, iterator_step, iterator_value, IteratorRecord};
use crate::realm::{Realm, WeakRealm};
use core_types::{JsError, JsObject, JsResult, Value, WellKnownSymbol};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// How a finished aggregate settles its capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Completion {
    /// Resolve with the collected values (`all`, `allSettled`).
    ResolveWithValues,
    /// Reject with an `AggregateError` of the collected reasons (`any`).
    RejectWithAggregate,
}

/// Bookkeeping shared by every element function of one combinator call.
///
/// `remaining` starts at 1 for the iteration itself so the aggregate cannot
/// complete before the iterator is exhausted.
struct AggregateState {
    values: RefCell<Vec<Value>>,
    remaining: Cell<usize>,
    capability: PromiseCapability,
    completion: Completion,
}

impl AggregateState {
    fn new(capability: PromiseCapability, completion: Completion) -> Rc<Self> {
        Rc::new(Self {
            values: RefCell::new(Vec::new()),
            remaining: Cell::new(1),
            capability,
            completion,
        })
    }

    /// Reserves the next slot and returns its index.
    fn push_placeholder(&self) -> usize {
        let mut values = self.values.borrow_mut();
        values.push(Value::Undefined);
        values.len() - 1
    }

    fn increment(&self) {
        self.remaining.set(self.remaining.get() + 1);
    }

    /// Decrements the remaining count and settles the capability at zero.
    fn decrement(&self, realm: &Realm) -> JsResult<Value> {
        let remaining = self.remaining.get().saturating_sub(1);
        self.remaining.set(remaining);
        if remaining > 0 {
            return Ok(Value::Undefined);
        }
        let values = realm.create_array(self.values.borrow().clone());
        match self.completion {
            Completion::ResolveWithValues => self.capability.resolve(values),
            Completion::RejectWithAggregate => {
                let error = realm.create_error(JsError::aggregate("All promises were rejected"));
                if let Some(object) = error.as_object() {
                    object.set("errors", values);
                }
                self.capability.reject(error)
            }
        }
    }

    fn store(&self, index: usize, value: Value) {
        if let Some(slot) = self.values.borrow_mut().get_mut(index) {
            *slot = value;
        }
    }
}

/// What an element function records before decrementing.
#[derive(Debug, Clone, Copy)]
enum ElementKind {
    /// The value itself
    Value,
    /// `{ status: "fulfilled", value }`
    SettledFulfilled,
    /// `{ status: "rejected", reason }`
    SettledRejected,
}

/// Creates a one-shot element function writing to `index`.
///
/// `already_called` may be shared between several element functions of the
/// same index (`allSettled` shares it between its two handlers).
fn element_function(
    realm: &WeakRealm,
    state: &Rc<AggregateState>,
    index: usize,
    already_called: Rc<Cell<bool>>,
    kind: ElementKind,
) -> Value {
    let weak = realm.clone();
    let state = state.clone();
    Value::Object(JsObject::function("", move |_this, args| {
        if already_called.replace(true) {
            return Ok(Value::Undefined);
        }
        let realm = weak.upgrade()?;
        let x = argument(args, 0);
        let entry = match kind {
            ElementKind::Value => x,
            ElementKind::SettledFulfilled => {
                let record = realm.create_object();
                record.set("status", "fulfilled");
                record.set("value", x);
                Value::Object(record)
            }
            ElementKind::SettledRejected => {
                let record = realm.create_object();
                record.set("status", "rejected");
                record.set("reason", x);
                Value::Object(record)
            }
        };
        state.store(index, entry);
        state.decrement(&realm)
    }))
}

/// How the combinator finds the constructor it builds its capability from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConstructorLookup {
    /// `C[@@species]` when that is neither undefined nor null (`all`, `race`).
    Species,
    /// The receiver itself (`allSettled`, `any`).
    Receiver,
}

/// `C`, or `C[@@species]` for the combinators that honour it.
fn combinator_constructor(this: &Value, name: &str, lookup: ConstructorLookup) -> JsResult<Value> {
    if this.as_object().is_none() {
        return Err(JsError::type_error(format!("Promise.{} called on non-object", name)).into());
    }
    if lookup == ConstructorLookup::Receiver {
        return Ok(this.clone());
    }
    let species = this.get(WellKnownSymbol::Species)?;
    if species.is_nullish() {
        Ok(this.clone())
    } else {
        Ok(species)
    }
}

/// GetPromiseResolve(C).
fn get_promise_resolve(constructor: &Value) -> JsResult<Value> {
    let resolve = constructor.get("resolve")?;
    if !resolve.is_callable() {
        return Err(JsError::type_error("Promise resolve is not a function").into());
    }
    Ok(resolve)
}

/// Turns each iterated value into a promise.
enum NextPromise {
    /// `Invoke(C, "resolve", value)` per element (`all`, `race`).
    Invoke,
    /// `C.resolve` read once before iteration (`allSettled`, `any`).
    Cached(Value),
}

impl NextPromise {
    fn resolve(&self, constructor: &Value, value: Value) -> JsResult<Value> {
        match self {
            NextPromise::Invoke => constructor.invoke("resolve", &[value]),
            NextPromise::Cached(resolve) => resolve.call(constructor, &[value]),
        }
    }
}

/// Advances the iterator, marking the record done on exhaustion or on a throw.
fn next_value(record: &mut IteratorRecord) -> JsResult<Option<Value>> {
    let step = iterator_step(record).and_then(|next| next.map(|r| iterator_value(&r)).transpose());
    match step {
        Ok(Some(value)) => Ok(Some(value)),
        Ok(None) => {
            record.done = true;
            Ok(None)
        }
        Err(exception) => {
            record.done = true;
            Err(exception)
        }
    }
}

/// The per-element loop of one combinator.
type PerformFn =
    fn(&Realm, &mut IteratorRecord, &Value, &NextPromise, &PromiseCapability) -> JsResult<Value>;

/// Shared driver: constructor, capability, `resolve` lookup, iterator, loop
/// and close-on-abrupt.
///
/// A failing `GetPromiseResolve` rejects before the iterable is touched.
fn run_combinator(
    realm: &Realm,
    this: &Value,
    args: &[Value],
    name: &str,
    lookup: ConstructorLookup,
    perform: PerformFn,
) -> JsResult<Value> {
    let constructor = combinator_constructor(this, name, lookup)?;
    let capability = new_promise_capability(&constructor)?;
    let next_promise = match lookup {
        ConstructorLookup::Species => NextPromise::Invoke,
        ConstructorLookup::Receiver => match get_promise_resolve(&constructor) {
            Ok(resolve) => NextPromise::Cached(resolve),
            Err(exception) => return capability.if_abrupt_reject(Err(exception)),
        },
    };
    let mut record = match get_iterator(&argument(args, 0)) {
        Ok(record) => record,
        Err(exception) => return capability.if_abrupt_reject(Err(exception)),
    };
    let mut result = perform(realm, &mut record, &constructor, &next_promise, &capability);
    if result.is_err() && !record.done {
        result = iterator_close(&record, result);
    }
    capability.if_abrupt_reject(result)
}

/// `Promise.all(iterable)`
pub(crate) fn promise_all(realm: &Realm, this: &Value, args: &[Value]) -> JsResult<Value> {
    run_combinator(realm, this, args, "all", ConstructorLookup::Species, perform_promise_all)
}

fn perform_promise_all(
    realm: &Realm,
    record: &mut IteratorRecord,
    constructor: &Value,
    next_promise: &NextPromise,
    capability: &PromiseCapability,
) -> JsResult<Value> {
    let state = AggregateState::new(capability.clone(), Completion::ResolveWithValues);
    let weak = realm.downgrade();
    while let Some(value) = next_value(record)? {
        let index = state.push_placeholder();
        let promise = next_promise.resolve(constructor, value)?;
        let resolve_element = element_function(
            &weak,
            &state,
            index,
            Rc::new(Cell::new(false)),
            ElementKind::Value,
        );
        state.increment();
        promise.invoke("then", &[resolve_element, capability.reject.clone()])?;
    }
    state.decrement(realm)?;
    Ok(capability.promise.clone())
}

/// `Promise.race(iterable)`
pub(crate) fn promise_race(realm: &Realm, this: &Value, args: &[Value]) -> JsResult<Value> {
    run_combinator(realm, this, args, "race", ConstructorLookup::Species, perform_promise_race)
}

fn perform_promise_race(
    _realm: &Realm,
    record: &mut IteratorRecord,
    constructor: &Value,
    next_promise: &NextPromise,
    capability: &PromiseCapability,
) -> JsResult<Value> {
    while let Some(value) = next_value(record)? {
        let promise = next_promise.resolve(constructor, value)?;
        promise.invoke(
            "then",
            &[capability.resolve.clone(), capability.reject.clone()],
        )?;
    }
    Ok(capability.promise.clone())
}

/// `Promise.allSettled(iterable)`
pub(crate) fn promise_all_settled(realm: &Realm, this: &Value, args: &[Value]) -> JsResult<Value> {
    run_combinator(
        realm,
        this,
        args,
        "allSettled",
        ConstructorLookup::Receiver,
        perform_promise_all_settled,
    )
}

fn perform_promise_all_settled(
    realm: &Realm,
    record: &mut IteratorRecord,
    constructor: &Value,
    next_promise: &NextPromise,
    capability: &PromiseCapability,
) -> JsResult<Value> {
    let state = AggregateState::new(capability.clone(), Completion::ResolveWithValues);
    let weak = realm.downgrade();
    while let Some(value) = next_value(record)? {
        let index = state.push_placeholder();
        let promise = next_promise.resolve(constructor, value)?;
        let already_called = Rc::new(Cell::new(false));
        let on_fulfilled = element_function(
            &weak,
            &state,
            index,
            already_called.clone(),
            ElementKind::SettledFulfilled,
        );
        let on_rejected = element_function(
            &weak,
            &state,
            index,
            already_called,
            ElementKind::SettledRejected,
        );
        state.increment();
        promise.invoke("then", &[on_fulfilled, on_rejected])?;
    }
    state.decrement(realm)?;
    Ok(capability.promise.clone())
}

/// `Promise.any(iterable)`
pub(crate) fn promise_any(realm: &Realm, this: &Value, args: &[Value]) -> JsResult<Value> {
    run_combinator(realm, this, args, "any", ConstructorLookup::Receiver, perform_promise_any)
}

fn perform_promise_any(
    realm: &Realm,
    record: &mut IteratorRecord,
    constructor: &Value,
    next_promise: &NextPromise,
    capability: &PromiseCapability,
) -> JsResult<Value> {
    let state = AggregateState::new(capability.clone(), Completion::RejectWithAggregate);
    let weak = realm.downgrade();
    while let Some(value) = next_value(record)? {
        let index = state.push_placeholder();
        let promise = next_promise.resolve(constructor, value)?;
        let reject_element = element_function(
            &weak,
            &state,
            index,
            Rc::new(Cell::new(false)),
            ElementKind::Value,
        );
        state.increment();
        promise.invoke("then", &[capability.resolve.clone(), reject_element])?;
    }
    state.decrement(realm)?;
    Ok(capability.promise.clone())
}
