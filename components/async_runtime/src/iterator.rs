//! Iteration protocol used by the combinators.

use crate::realm::{Realm, WeakRealm};
use core_types::{JsError, JsObject, JsResult, Value, WellKnownSymbol};
use std::cell::Cell;
use std::rc::Rc;

/// An iterator plus its cached `next` method and a `done` flag.
///
/// `done` is set whenever the iterator must not be closed again: after it
/// reported completion or after one of its own methods threw.
#[derive(Debug, Clone)]
pub struct IteratorRecord {
    /// The iterator object
    pub iterator: Value,
    /// `iterator.next`, read once
    pub next_method: Value,
    /// Whether the iterator is exhausted or broken
    pub done: bool,
}

/// GetIterator(obj, sync).
pub fn get_iterator(iterable: &Value) -> JsResult<IteratorRecord> {
    let method = iterable.get(WellKnownSymbol::Iterator)?;
    if !method.is_callable() {
        return Err(JsError::type_error(format!("{} is not iterable", iterable.type_of())).into());
    }
    let iterator = method.call(iterable, &[])?;
    if iterator.as_object().is_none() {
        return Err(JsError::type_error("Result of the Symbol.iterator method is not an object").into());
    }
    let next_method = iterator.get("next")?;
    Ok(IteratorRecord {
        iterator,
        next_method,
        done: false,
    })
}

/// IteratorStep: the next result object, or `None` once the iterator is done.
pub fn iterator_step(record: &IteratorRecord) -> JsResult<Option<Value>> {
    let result = record.next_method.call(&record.iterator, &[])?;
    if result.as_object().is_none() {
        return Err(JsError::type_error(format!("Iterator result {} is not an object", result)).into());
    }
    if result.get("done")?.is_truthy() {
        Ok(None)
    } else {
        Ok(Some(result))
    }
}

/// IteratorValue.
pub fn iterator_value(result: &Value) -> JsResult<Value> {
    result.get("value")
}

/// IteratorClose(iteratorRecord, completion).
///
/// Calls the iterator's `return` method. A throw completion passed in always
/// wins over anything `return` does; for a normal completion a throw from
/// `return`, or a non-object result, replaces it.
pub fn iterator_close(record: &IteratorRecord, completion: JsResult<Value>) -> JsResult<Value> {
    let return_method = match record.iterator.get("return") {
        Ok(method) => method,
        Err(exception) => return completion.and(Err(exception)),
    };
    if return_method.is_nullish() {
        return completion;
    }
    let inner = return_method.call(&record.iterator, &[]);
    let value = completion?;
    let inner = inner?;
    if inner.as_object().is_none() {
        return Err(JsError::type_error("Iterator return() result is not an object").into());
    }
    Ok(value)
}

/// Builds `%Array.prototype%` with its `@@iterator` method.
pub(crate) fn create_array_prototype(realm: &WeakRealm, object_prototype: &JsObject) -> JsObject {
    let prototype = JsObject::ordinary(Some(object_prototype.clone()));
    let weak = realm.clone();
    let values = JsObject::function("values", move |this, _args| {
        let realm = weak.upgrade()?;
        if this.is_nullish() {
            return Err(JsError::type_error("Array.prototype.values called on null or undefined").into());
        }
        Ok(create_array_iterator(&realm, this.clone()))
    });
    prototype.set("values", values.clone());
    prototype.set(WellKnownSymbol::Iterator, values);
    prototype
}

/// An iterator over `array` that reads `length` and elements live on every step.
fn create_array_iterator(realm: &Realm, array: Value) -> Value {
    let iterator = realm.create_object();
    let index = Rc::new(Cell::new(0usize));
    let exhausted = Rc::new(Cell::new(false));
    let weak = realm.downgrade();
    let next = JsObject::function("next", move |_this, _args| {
        let realm = weak.upgrade()?;
        if exhausted.get() {
            return Ok(realm.create_iter_result(Value::Undefined, true));
        }
        let length = array.get("length")?.as_number().unwrap_or(0.0);
        let current = index.get();
        if current as f64 >= length {
            exhausted.set(true);
            return Ok(realm.create_iter_result(Value::Undefined, true));
        }
        index.set(current + 1);
        let value = array.get(current.to_string())?;
        Ok(realm.create_iter_result(value, false))
    });
    iterator.set("next", next);
    let this_iterator = JsObject::function("[Symbol.iterator]", |this, _args| Ok(this.clone()));
    iterator.set(WellKnownSymbol::Iterator, this_iterator);
    Value::Object(iterator)
}
