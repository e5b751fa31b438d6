//! Promise capabilities.

use core_types::{JsError, JsObject, JsResult, Value};
use std::cell::RefCell;
use std::rc::Rc;

/// A `{promise, resolve, reject}` triple produced from any promise constructor.
///
/// `resolve` and `reject` are whatever the constructor handed to its executor;
/// they are only guaranteed to be callable.
#[derive(Debug, Clone)]
pub struct PromiseCapability {
    /// The promise-like object
    pub promise: Value,
    /// Function resolving `promise`
    pub resolve: Value,
    /// Function rejecting `promise`
    pub reject: Value,
}

impl PromiseCapability {
    /// Calls the capability's resolve function with `value`.
    pub fn resolve(&self, value: Value) -> JsResult<Value> {
        self.resolve.call(&Value::Undefined, &[value])
    }

    /// Calls the capability's reject function with `reason`.
    pub fn reject(&self, reason: Value) -> JsResult<Value> {
        self.reject.call(&Value::Undefined, &[reason])
    }

    /// IfAbruptRejectPromise: routes `completion` into the capability.
    ///
    /// A normal completion passes through. A throw rejects the capability and
    /// yields its promise; only a throw from the reject call itself escapes.
    pub fn if_abrupt_reject(&self, completion: JsResult<Value>) -> JsResult<Value> {
        match completion {
            Ok(value) => Ok(value),
            Err(exception) => {
                self.reject(exception.into_value())?;
                Ok(self.promise.clone())
            }
        }
    }
}

/// NewPromiseCapability(C).
///
/// Constructs `C` with a GetCapabilitiesExecutor and collects the resolve and
/// reject functions it receives.
pub fn new_promise_capability(constructor: &Value) -> JsResult<PromiseCapability> {
    if !constructor.is_constructor() {
        return Err(JsError::type_error("Promise capability target is not a constructor").into());
    }
    let slots = Rc::new(RefCell::new((Value::Undefined, Value::Undefined)));
    let captured = slots.clone();
    let executor = JsObject::function("", move |_this, args| {
        let mut slots = captured.borrow_mut();
        if !slots.0.is_undefined() {
            return Err(JsError::type_error("Promise executor already received a resolve function").into());
        }
        if !slots.1.is_undefined() {
            return Err(JsError::type_error("Promise executor already received a reject function").into());
        }
        slots.0 = args.first().cloned().unwrap_or(Value::Undefined);
        slots.1 = args.get(1).cloned().unwrap_or(Value::Undefined);
        Ok(Value::Undefined)
    });
    let promise = constructor.construct(&[Value::Object(executor)])?;
    let (resolve, reject) = slots.borrow().clone();
    if !resolve.is_callable() {
        return Err(JsError::type_error("Promise resolve function is not callable").into());
    }
    if !reject.is_callable() {
        return Err(JsError::type_error("Promise reject function is not callable").into());
    }
    Ok(PromiseCapability {
        promise,
        resolve,
        reject,
    })
}
