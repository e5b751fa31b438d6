//! The `Promise` constructor, its prototype methods and static `resolve`/`reject`.

use crate::capability::new_promise_capability;
use crate::combinators::{promise_all, promise_all_settled, promise_any, promise_race};
use crate::promise::JsPromise;
use crate::reaction::perform_promise_then;
use crate::realm::{Realm, WeakRealm};
use crate::resolving::create_resolving_functions;
use core_types::{
    prototype_from_constructor, species_constructor, Exception, JsError, JsObject, JsResult, Value,
    WellKnownSymbol,
};

/// Signature shared by every native built-in.
pub(crate) type Builtin = fn(&Realm, &Value, &[Value]) -> JsResult<Value>;

/// Wraps `f` as a function object that upgrades the realm on each call.
pub(crate) fn builtin_function(realm: &WeakRealm, name: &str, f: Builtin) -> JsObject {
    let weak = realm.clone();
    JsObject::function(name, move |this, args| {
        let realm = weak.upgrade()?;
        f(&realm, this, args)
    })
}

pub(crate) fn argument(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or(Value::Undefined)
}

/// Builds `%Promise%` and `%Promise.prototype%`.
pub(crate) fn create_promise_intrinsics(
    realm: &WeakRealm,
    object_prototype: &JsObject,
) -> (JsObject, JsObject) {
    let prototype = JsObject::ordinary(Some(object_prototype.clone()));
    let weak = realm.clone();
    let constructor = JsObject::constructor(
        "Promise",
        |_this, _args| {
            Err(JsError::type_error("Promise constructor cannot be invoked without 'new'").into())
        },
        move |args, new_target| {
            let realm = weak.upgrade()?;
            promise_construct(&realm, args, new_target)
        },
    );

    constructor.set("prototype", prototype.clone());
    constructor.set("resolve", builtin_function(realm, "resolve", promise_static_resolve));
    constructor.set("reject", builtin_function(realm, "reject", promise_static_reject));
    constructor.set("all", builtin_function(realm, "all", promise_all));
    constructor.set("race", builtin_function(realm, "race", promise_race));
    constructor.set("allSettled", builtin_function(realm, "allSettled", promise_all_settled));
    constructor.set("any", builtin_function(realm, "any", promise_any));
    let species = JsObject::function("get [Symbol.species]", |this, _args| Ok(this.clone()));
    constructor.define_accessor(WellKnownSymbol::Species, Some(Value::Object(species)), None);

    prototype.set("constructor", constructor.clone());
    prototype.set("then", builtin_function(realm, "then", promise_then));
    prototype.set("catch", builtin_function(realm, "catch", promise_catch));
    prototype.set("finally", builtin_function(realm, "finally", promise_finally));
    prototype.set(WellKnownSymbol::ToStringTag, "Promise");

    (constructor, prototype)
}

/// `new Promise(executor)`
fn promise_construct(realm: &Realm, args: &[Value], new_target: &JsObject) -> JsResult<Value> {
    let executor = argument(args, 0);
    if !executor.is_callable() {
        return Err(JsError::type_error(format!("Promise resolver {} is not a function", executor)).into());
    }
    let prototype = prototype_from_constructor(new_target, &realm.promise_prototype())?;
    let promise = JsPromise::create(&prototype);
    let functions = create_resolving_functions(realm, &promise);
    let completion = executor.call(
        &Value::Undefined,
        &[functions.resolve.clone(), functions.reject.clone()],
    );
    if let Err(exception) = completion {
        functions
            .reject
            .call(&Value::Undefined, &[exception.into_value()])?;
    }
    Ok(promise.to_value())
}

/// PromiseResolve(C, x).
///
/// Returns `x` unchanged when it is already a promise whose `constructor` is `C`.
pub fn promise_resolve(constructor: &JsObject, value: Value) -> JsResult<Value> {
    let constructor_value = Value::Object(constructor.clone());
    if JsPromise::from_value(&value).is_some() {
        let value_constructor = value.get("constructor")?;
        if value_constructor.same_value(&constructor_value) {
            return Ok(value);
        }
    }
    let capability = new_promise_capability(&constructor_value)?;
    capability.resolve(value)?;
    Ok(capability.promise)
}

/// `Promise.resolve(x)`
fn promise_static_resolve(_realm: &Realm, this: &Value, args: &[Value]) -> JsResult<Value> {
    let constructor = this
        .as_object()
        .ok_or_else(|| Exception::from(JsError::type_error("Promise.resolve called on non-object")))?;
    promise_resolve(constructor, argument(args, 0))
}

/// `Promise.reject(r)`
fn promise_static_reject(_realm: &Realm, this: &Value, args: &[Value]) -> JsResult<Value> {
    let capability = new_promise_capability(this)?;
    capability.reject(argument(args, 0))?;
    Ok(capability.promise)
}

/// `Promise.prototype.then(onFulfilled, onRejected)`
fn promise_then(realm: &Realm, this: &Value, args: &[Value]) -> JsResult<Value> {
    let promise = JsPromise::from_value(this).ok_or_else(|| {
        Exception::from(JsError::type_error(
            "Method Promise.prototype.then called on incompatible receiver",
        ))
    })?;
    let constructor = species_constructor(promise.object(), &realm.promise_constructor())?;
    let capability = new_promise_capability(&Value::Object(constructor))?;
    Ok(perform_promise_then(
        realm,
        &promise,
        &argument(args, 0),
        &argument(args, 1),
        capability,
    ))
}

/// `Promise.prototype.catch(onRejected)`
fn promise_catch(_realm: &Realm, this: &Value, args: &[Value]) -> JsResult<Value> {
    this.invoke("then", &[Value::Undefined, argument(args, 0)])
}

/// `Promise.prototype.finally(onFinally)`
fn promise_finally(realm: &Realm, this: &Value, args: &[Value]) -> JsResult<Value> {
    let promise = this.as_object().ok_or_else(|| {
        Exception::from(JsError::type_error(
            "Method Promise.prototype.finally called on non-object",
        ))
    })?;
    let constructor = species_constructor(promise, &realm.promise_constructor())?;
    let on_finally = argument(args, 0);
    if !on_finally.is_callable() {
        return this.invoke("then", &[on_finally.clone(), on_finally]);
    }

    let then_finally = {
        let on_finally = on_finally.clone();
        let constructor = constructor.clone();
        JsObject::function("", move |_this, args| {
            let value = argument(args, 0);
            let result = on_finally.call(&Value::Undefined, &[])?;
            let promise = promise_resolve(&constructor, result)?;
            let value_thunk = JsObject::function("", move |_, _| Ok(value.clone()));
            promise.invoke("then", &[Value::Object(value_thunk)])
        })
    };
    let catch_finally = JsObject::function("", move |_this, args| {
        let reason = argument(args, 0);
        let result = on_finally.call(&Value::Undefined, &[])?;
        let promise = promise_resolve(&constructor, result)?;
        let thrower = JsObject::function("", move |_, _| Err(Exception::new(reason.clone())));
        promise.invoke("then", &[Value::Object(thrower)])
    });
    this.invoke(
        "then",
        &[Value::Object(then_finally), Value::Object(catch_finally)],
    )
}
