//! Shared helpers for the unit tests.

use async_runtime::{JsPromise, Realm};
use core_types::{JsObject, Value};
use std::cell::RefCell;
use std::rc::Rc;
use tracing_subscriber::EnvFilter;

/// Installs a test subscriber once; set `RUST_LOG=async_runtime=trace` to see jobs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn realm() -> Realm {
    init_tracing();
    Realm::new()
}

pub fn promise_ctor(realm: &Realm) -> Value {
    Value::Object(realm.promise_constructor())
}

pub fn as_promise(value: &Value) -> JsPromise {
    JsPromise::from_value(value).expect("value is not a promise")
}

/// Event log shared between handlers.
pub type Log = Rc<RefCell<Vec<String>>>;

pub fn log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

/// A handler that records `label:arg` and returns its argument.
pub fn recorder(log: &Log, label: &str) -> Value {
    let log = log.clone();
    let name = label.to_string();
    let label = label.to_string();
    Value::Object(JsObject::function(&name, move |_this, args| {
        let arg = args.first().cloned().unwrap_or(Value::Undefined);
        log.borrow_mut().push(format!("{}:{}", label, arg));
        Ok(arg)
    }))
}

pub fn entries(log: &Log) -> Vec<String> {
    log.borrow().clone()
}

/// `new Promise(() => {})` plus its captured resolve/reject functions.
pub fn deferred(realm: &Realm) -> (Value, Value, Value) {
    let capability = async_runtime::new_promise_capability(&promise_ctor(realm)).unwrap();
    (capability.promise, capability.resolve, capability.reject)
}

pub fn call1(f: &Value, arg: Value) -> Value {
    f.call(&Value::Undefined, &[arg]).unwrap()
}

pub fn elements(value: &Value) -> Vec<Value> {
    value
        .as_object()
        .and_then(JsObject::array_elements)
        .expect("value is not an array")
}
