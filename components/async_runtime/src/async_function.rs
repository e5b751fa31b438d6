//! Async function driver.
//!
//! An activation owns its suspended body as `DriverState::Suspended`. Each
//! `await` moves the driver handle into a pair of resumption functions
//! attached to the awaited promise; whichever fires first takes the body out
//! of the state, so a resumption can only ever happen once per `await`.

use crate::builtins::argument;
use crate::capability::{new_promise_capability, PromiseCapability};
use crate::coroutine::{Coroutine, CoroutineStep, ResumeCompletion};
use crate::promise::JsPromise;
use crate::reaction::perform_promise_then;
use crate::realm::{ExecutionContext, Realm};
use core_types::{JsError, JsObject, JsResult, Value};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::trace;

enum DriverState {
    Running,
    Suspended(Box<dyn Coroutine>),
    Completed,
}

/// One activation of an async function.
pub struct AsyncFunctionDriver {
    state: RefCell<DriverState>,
    capability: PromiseCapability,
    context: ExecutionContext,
}

impl AsyncFunctionDriver {
    /// The promise returned to the caller of the async function.
    pub fn promise(&self) -> &Value {
        &self.capability.promise
    }

    /// Whether the body has returned or thrown.
    pub fn is_completed(&self) -> bool {
        matches!(*self.state.borrow(), DriverState::Completed)
    }

    /// Resumes the suspended body with `completion` inside its own execution
    /// context, then handles the step it stops at.
    pub fn resume(self: &Rc<Self>, realm: &Realm, completion: ResumeCompletion) -> JsResult<()> {
        let mut completion = completion;
        loop {
            let mut body = match self.state.replace(DriverState::Running) {
                DriverState::Suspended(body) => body,
                other => {
                    self.state.replace(other);
                    return Err(JsError::internal("async function resumed while not suspended").into());
                }
            };
            let step = {
                let _context = realm.enter_context(self.context.clone());
                body.resume(realm, completion)
            };
            match step {
                Ok(CoroutineStep::Await(value)) => {
                    self.state.replace(DriverState::Suspended(body));
                    match await_value(realm, self, value) {
                        Ok(()) => return Ok(()),
                        // The await itself failed; the body observes it as a throw.
                        Err(exception) => completion = ResumeCompletion::Throw(exception.into_value()),
                    }
                }
                Ok(CoroutineStep::Complete(value)) => {
                    self.state.replace(DriverState::Completed);
                    trace!(context = %self.context.name, "async function returned");
                    self.capability.resolve(value)?;
                    return Ok(());
                }
                Err(exception) => {
                    self.state.replace(DriverState::Completed);
                    trace!(context = %self.context.name, "async function threw");
                    self.capability.reject(exception.into_value())?;
                    return Ok(());
                }
            }
        }
    }
}

/// AsyncFunctionStart: runs `body` synchronously up to its first `await` and
/// returns the activation's promise.
pub fn async_function_start<C>(realm: &Realm, name: &str, body: C) -> JsResult<Value>
where
    C: Coroutine + 'static,
{
    let capability = new_promise_capability(&Value::Object(realm.promise_constructor()))?;
    let driver = Rc::new(AsyncFunctionDriver {
        state: RefCell::new(DriverState::Suspended(Box::new(body))),
        capability,
        context: realm.new_execution_context(name),
    });
    driver.resume(realm, ResumeCompletion::Normal(Value::Undefined))?;
    Ok(driver.promise().clone())
}

/// Await(value): wraps `value` in a promise and attaches the two resumption
/// functions through a throwaway, already-handled capability.
pub fn await_value(realm: &Realm, driver: &Rc<AsyncFunctionDriver>, value: Value) -> JsResult<()> {
    let constructor = Value::Object(realm.promise_constructor());
    let wrapper = new_promise_capability(&constructor)?;
    wrapper.resolve(value)?;
    let awaited = JsPromise::from_value(&wrapper.promise)
        .ok_or_else(|| JsError::internal("await wrapper is not a promise"))?;

    let on_fulfilled = resumption_function(realm, driver, false);
    let on_rejected = resumption_function(realm, driver, true);

    let throwaway = new_promise_capability(&constructor)?;
    if let Some(promise) = JsPromise::from_value(&throwaway.promise) {
        promise.set_handled(true);
    }
    perform_promise_then(realm, &awaited, &on_fulfilled, &on_rejected, throwaway);
    Ok(())
}

fn resumption_function(realm: &Realm, driver: &Rc<AsyncFunctionDriver>, throws: bool) -> Value {
    let weak = realm.downgrade();
    let driver = driver.clone();
    Value::Object(JsObject::function("", move |_this, args| {
        let realm = weak.upgrade()?;
        let value = argument(args, 0);
        let completion = if throws {
            ResumeCompletion::Throw(value)
        } else {
            ResumeCompletion::Normal(value)
        };
        driver.resume(&realm, completion)?;
        Ok(Value::Undefined)
    }))
}
