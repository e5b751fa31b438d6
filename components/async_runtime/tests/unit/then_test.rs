//! Unit tests for then / catch / finally and PerformPromiseThen

use crate::support::*;
use async_runtime::{
    new_promise_capability, perform_promise_then, JsPromise, PromiseState,
};
use core_types::{ErrorKind, Exception, JsObject, Value, WellKnownSymbol};
use std::cell::Cell;
use std::rc::Rc;

#[test]
fn reactions_fire_in_attachment_order() {
    let realm = realm();
    let log = log();
    let (promise, resolve, _) = deferred(&realm);
    promise.invoke("then", &[recorder(&log, "r1")]).unwrap();
    promise.invoke("then", &[recorder(&log, "r2")]).unwrap();
    promise.invoke("then", &[recorder(&log, "r3")]).unwrap();

    call1(&resolve, Value::Smi(1));
    assert!(entries(&log).is_empty());
    realm.run_jobs().unwrap();
    assert_eq!(entries(&log), vec!["r1:1", "r2:1", "r3:1"]);
}

#[test]
fn then_on_settled_promise_never_runs_synchronously() {
    let realm = realm();
    let log = log();
    let resolved = promise_ctor(&realm)
        .invoke("resolve", &[Value::from("v")])
        .unwrap();
    resolved.invoke("then", &[recorder(&log, "h")]).unwrap();
    assert!(entries(&log).is_empty());
    assert_eq!(realm.pending_job_count(), 1);
    realm.run_jobs().unwrap();
    assert_eq!(entries(&log), vec!["h:v"]);
}

#[test]
fn chained_then_receives_fulfillment_of_returned_promise() {
    let realm = realm();
    let log = log();
    let (inner, resolve_inner, _) = deferred(&realm);
    let inner_for_handler = inner.clone();
    let f = JsObject::function("f", move |_, _| Ok(inner_for_handler.clone()));

    let start = promise_ctor(&realm).invoke("resolve", &[Value::Smi(0)]).unwrap();
    let chained = start
        .invoke("then", &[Value::Object(f)])
        .unwrap()
        .invoke("then", &[recorder(&log, "g")])
        .unwrap();

    realm.run_jobs().unwrap();
    assert!(entries(&log).is_empty());

    call1(&resolve_inner, Value::from("q-value"));
    realm.run_jobs().unwrap();
    assert_eq!(entries(&log), vec!["g:q-value"]);
    assert_eq!(as_promise(&chained).result(), Value::from("q-value"));
}

#[test]
fn non_callable_handlers_pass_through() {
    let realm = realm();
    let log = log();
    let rejected = promise_ctor(&realm)
        .invoke("reject", &[Value::from("err")])
        .unwrap();
    rejected
        .invoke("then", &[Value::Smi(1)])
        .unwrap()
        .invoke("then", &[Value::Undefined, recorder(&log, "caught")])
        .unwrap();

    let fulfilled = promise_ctor(&realm).invoke("resolve", &[Value::Smi(9)]).unwrap();
    fulfilled
        .invoke("then", &[Value::Undefined, Value::Undefined])
        .unwrap()
        .invoke("then", &[recorder(&log, "value")])
        .unwrap();

    realm.run_jobs().unwrap();
    let mut seen = entries(&log);
    seen.sort();
    assert_eq!(seen, vec!["caught:err", "value:9"]);
}

#[test]
fn handler_throw_rejects_downstream() {
    let realm = realm();
    let log = log();
    let thrower = JsObject::function("t", |_, _| Err(Exception::new(Value::from("thrown"))));
    let start = promise_ctor(&realm).invoke("resolve", &[Value::Null]).unwrap();
    let downstream = start.invoke("then", &[Value::Object(thrower)]).unwrap();
    downstream.invoke("catch", &[recorder(&log, "c")]).unwrap();
    realm.run_jobs().unwrap();
    assert_eq!(as_promise(&downstream).state(), PromiseState::Rejected);
    assert_eq!(entries(&log), vec!["c:thrown"]);
}

#[test]
fn then_on_non_promise_is_type_error() {
    let realm = realm();
    let then = realm.promise_prototype().get("then").unwrap();
    let err = then
        .call(&Value::Object(realm.create_object()), &[])
        .unwrap_err();
    assert_eq!(err.error_data().unwrap().kind, ErrorKind::TypeError);
}

#[test]
fn catch_invokes_then_generically() {
    let realm = realm();
    let calls = Rc::new(Cell::new(0));
    let counter = calls.clone();
    let fake = realm.create_object();
    fake.set(
        "then",
        JsObject::function("then", move |_this, args| {
            counter.set(counter.get() + 1);
            assert!(args[0].is_undefined());
            Ok(Value::from("from fake then"))
        }),
    );
    let catch = realm.promise_prototype().get("catch").unwrap();
    let result = catch
        .call(&Value::Object(fake), &[Value::Undefined])
        .unwrap();
    assert_eq!(calls.get(), 1);
    assert_eq!(result, Value::from("from fake then"));
}

#[test]
fn then_uses_species_constructor() {
    let realm = realm();
    let constructed = Rc::new(Cell::new(0));
    let counter = constructed.clone();
    let base = realm.promise_constructor();
    let species = JsObject::constructor(
        "Species",
        |_, _| Ok(Value::Undefined),
        move |args, new_target| {
            counter.set(counter.get() + 1);
            base.construct(args, new_target)
        },
    );
    let ctor = realm.create_object();
    ctor.set(WellKnownSymbol::Species, species);

    let promise = promise_ctor(&realm).invoke("resolve", &[Value::Smi(1)]).unwrap();
    promise.as_object().unwrap().set("constructor", ctor);
    promise.invoke("then", &[Value::Undefined]).unwrap();
    assert_eq!(constructed.get(), 1);
}

#[test]
fn finally_passes_value_through() {
    let realm = realm();
    let log = log();
    let start = promise_ctor(&realm).invoke("resolve", &[Value::Smi(5)]).unwrap();
    let result = start
        .invoke("finally", &[recorder(&log, "finally")])
        .unwrap();
    realm.run_jobs().unwrap();
    assert_eq!(entries(&log), vec!["finally:undefined"]);
    let result = as_promise(&result);
    assert_eq!(result.state(), PromiseState::Fulfilled);
    assert_eq!(result.result(), Value::Smi(5));
}

#[test]
fn finally_preserves_rejection_reason() {
    let realm = realm();
    let start = promise_ctor(&realm)
        .invoke("reject", &[Value::from("bad")])
        .unwrap();
    let noop = JsObject::function("noop", |_, _| Ok(Value::Smi(100)));
    let result = start.invoke("finally", &[Value::Object(noop)]).unwrap();
    realm.run_jobs().unwrap();
    let result = as_promise(&result);
    assert_eq!(result.state(), PromiseState::Rejected);
    assert_eq!(result.result(), Value::from("bad"));
}

#[test]
fn finally_callback_throw_overrides() {
    let realm = realm();
    let start = promise_ctor(&realm).invoke("resolve", &[Value::Smi(1)]).unwrap();
    let thrower = JsObject::function("t", |_, _| Err(Exception::new(Value::from("finally threw"))));
    let result = start.invoke("finally", &[Value::Object(thrower)]).unwrap();
    realm.run_jobs().unwrap();
    assert_eq!(as_promise(&result).result(), Value::from("finally threw"));
}

#[test]
fn perform_promise_then_returns_capability_promise() {
    let realm = realm();
    let source = JsPromise::create(&realm.promise_prototype());
    let capability = new_promise_capability(&promise_ctor(&realm)).unwrap();
    let expected = capability.promise.clone();
    let returned = perform_promise_then(
        &realm,
        &source,
        &Value::Undefined,
        &Value::Undefined,
        capability,
    );
    assert_eq!(returned, expected);
    assert_eq!(source.pending_reaction_count(), 1);
    assert!(source.is_handled());
}
