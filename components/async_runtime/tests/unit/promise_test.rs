//! Unit tests for promise objects and the constructor

use crate::support::*;
use async_runtime::{JsPromise, PromiseState, RejectionOperation};
use core_types::{ErrorKind, Exception, JsObject, Value};
use std::cell::RefCell;
use std::rc::Rc;

#[test]
fn new_promise_is_pending_and_unhandled() {
    let realm = realm();
    let (promise, _, _) = deferred(&realm);
    let promise = as_promise(&promise);
    assert_eq!(promise.state(), PromiseState::Pending);
    assert_eq!(promise.result(), Value::Undefined);
    assert!(!promise.is_handled());
}

#[test]
fn executor_runs_synchronously_with_resolving_functions() {
    let realm = realm();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    let executor = JsObject::function("executor", move |_this, args| {
        sink.borrow_mut().push(args.len());
        args[0].call(&Value::Undefined, &[Value::Smi(5)])
    });
    let promise = promise_ctor(&realm)
        .construct(&[Value::Object(executor)])
        .unwrap();
    assert_eq!(*seen.borrow(), vec![2]);
    let promise = as_promise(&promise);
    assert_eq!(promise.state(), PromiseState::Fulfilled);
    assert_eq!(promise.result(), Value::Smi(5));
}

#[test]
fn executor_throw_after_resolve_is_ignored() {
    let realm = realm();
    let executor = JsObject::function("executor", |_this, args| {
        args[0].call(&Value::Undefined, &[Value::Smi(1)])?;
        Err(Exception::new(Value::from("late")))
    });
    let promise = promise_ctor(&realm)
        .construct(&[Value::Object(executor)])
        .unwrap();
    let promise = as_promise(&promise);
    assert_eq!(promise.state(), PromiseState::Fulfilled);
    assert_eq!(promise.result(), Value::Smi(1));
}

#[test]
fn constructor_honours_new_target_prototype() {
    let realm = realm();
    let sub_proto = JsObject::ordinary(Some(realm.promise_prototype()));
    let base = realm.promise_constructor();
    let subclass = JsObject::constructor(
        "SubPromise",
        |_, _| Ok(Value::Undefined),
        move |args, new_target| base.construct(args, new_target),
    );
    subclass.set("prototype", sub_proto.clone());

    let executor = JsObject::function("", |_, _| Ok(Value::Undefined));
    let instance = Value::Object(subclass).construct(&[Value::Object(executor)]).unwrap();
    let object = instance.as_object().unwrap();
    assert!(object.prototype().unwrap().ptr_eq(&sub_proto));
    assert!(JsPromise::from_object(object).is_some());
}

#[test]
fn calling_without_new_is_type_error() {
    let realm = realm();
    let err = promise_ctor(&realm)
        .call(&Value::Undefined, &[Value::Undefined])
        .unwrap_err();
    assert_eq!(err.error_data().unwrap().kind, ErrorKind::TypeError);
}

#[test]
fn rejection_tracker_sees_reject_then_handle() {
    let realm = realm();
    let ops = Rc::new(RefCell::new(Vec::new()));
    let sink = ops.clone();
    realm.set_rejection_tracker(move |_promise, op| sink.borrow_mut().push(op));

    let rejected = promise_ctor(&realm)
        .invoke("reject", &[Value::from("why")])
        .unwrap();
    assert_eq!(*ops.borrow(), vec![RejectionOperation::Reject]);

    rejected.invoke("catch", &[recorder(&log(), "c")]).unwrap();
    assert_eq!(
        *ops.borrow(),
        vec![RejectionOperation::Reject, RejectionOperation::Handle]
    );
    assert!(as_promise(&rejected).is_handled());
}

#[test]
fn rejection_tracking_can_be_disabled() {
    init_tracing();
    let config = async_runtime::RuntimeConfig::default().without_rejection_tracking();
    let realm = async_runtime::Realm::with_config(config).unwrap();
    let calls = Rc::new(RefCell::new(0));
    let sink = calls.clone();
    realm.set_rejection_tracker(move |_, _| *sink.borrow_mut() += 1);
    promise_ctor(&realm)
        .invoke("reject", &[Value::Null])
        .unwrap();
    assert_eq!(*calls.borrow(), 0);
}

#[test]
fn promise_to_string_tag() {
    let realm = realm();
    let tag = realm
        .promise_prototype()
        .get(core_types::WellKnownSymbol::ToStringTag)
        .unwrap();
    assert_eq!(tag, Value::from("Promise"));
}
