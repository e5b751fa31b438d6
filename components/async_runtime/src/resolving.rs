//! Resolving functions.
//!
//! Each pair of resolve/reject functions shares one `already_resolved` cell;
//! whichever runs first flips it and the other becomes a no-op.

use crate::job_queue::{Job, QueueType};
use crate::promise::JsPromise;
use crate::realm::Realm;
use core_types::{JsError, JsObject, JsResult, Value};
use std::cell::Cell;
use std::rc::Rc;
use tracing::trace;

/// The resolve/reject function objects bound to one promise.
#[derive(Debug, Clone)]
pub struct ResolvingFunctions {
    /// `resolve(resolution)`
    pub resolve: Value,
    /// `reject(reason)`
    pub reject: Value,
}

/// CreateResolvingFunctions.
pub fn create_resolving_functions(realm: &Realm, promise: &JsPromise) -> ResolvingFunctions {
    let already_resolved = Rc::new(Cell::new(false));

    let resolve = {
        let already_resolved = already_resolved.clone();
        let promise = promise.clone();
        let weak = realm.downgrade();
        JsObject::function("", move |_this, args| {
            if already_resolved.replace(true) {
                return Ok(Value::Undefined);
            }
            let realm = weak.upgrade()?;
            let resolution = args.first().cloned().unwrap_or(Value::Undefined);
            resolve_promise(&realm, &promise, resolution)?;
            Ok(Value::Undefined)
        })
    };

    let reject = {
        let promise = promise.clone();
        let weak = realm.downgrade();
        JsObject::function("", move |_this, args| {
            if already_resolved.replace(true) {
                return Ok(Value::Undefined);
            }
            let realm = weak.upgrade()?;
            let reason = args.first().cloned().unwrap_or(Value::Undefined);
            promise.reject(&realm, reason);
            Ok(Value::Undefined)
        })
    };

    ResolvingFunctions {
        resolve: Value::Object(resolve),
        reject: Value::Object(reject),
    }
}

/// Body of a promise resolve function once the guard has been claimed.
///
/// Thenables are never followed synchronously: a resolve-thenable job is
/// queued instead.
pub fn resolve_promise(realm: &Realm, promise: &JsPromise, resolution: Value) -> JsResult<()> {
    let thenable = match &resolution {
        Value::Object(object) if object.ptr_eq(promise.object()) => {
            let error = realm.create_error(JsError::type_error(
                "Chaining cycle detected: promise resolved with itself",
            ));
            promise.reject(realm, error);
            return Ok(());
        }
        Value::Object(object) => object.clone(),
        _ => {
            promise.fulfill(realm, resolution);
            return Ok(());
        }
    };
    let then = match thenable.get("then") {
        Ok(then) => then,
        Err(exception) => {
            promise.reject(realm, exception.into_value());
            return Ok(());
        }
    };
    if !then.is_callable() {
        promise.fulfill(realm, resolution);
        return Ok(());
    }
    trace!("deferring thenable resolution");
    realm.enqueue_job(
        QueueType::Promise,
        Job::ResolveThenable {
            promise: promise.clone(),
            thenable: resolution,
            then,
        },
    );
    Ok(())
}
