//! Job bodies for promise reactions and thenable resolution.

use crate::promise::JsPromise;
use crate::reaction::{PromiseReaction, ReactionHandler};
use crate::realm::Realm;
use crate::resolving::create_resolving_functions;
use core_types::{JsResult, Value};

/// PromiseReactionJob.
///
/// Runs the handler and settles the downstream capability with its outcome.
/// The returned error is only ever a throw from the capability's own
/// resolve/reject functions.
pub fn promise_reaction_job(reaction: &PromiseReaction, argument: Value) -> JsResult<()> {
    let outcome = match &reaction.handler {
        ReactionHandler::Identity => Ok(argument),
        ReactionHandler::Thrower => Err(argument),
        ReactionHandler::Callable(handler) => handler
            .call(&Value::Undefined, &[argument])
            .map_err(|exception| exception.into_value()),
    };
    match outcome {
        Ok(value) => reaction.capability.resolve(value)?,
        Err(reason) => reaction.capability.reject(reason)?,
    };
    Ok(())
}

/// PromiseResolveThenableJob.
///
/// Calls `then` on the thenable with fresh resolving functions for
/// `promise`; a throw from `then` rejects through those same functions.
pub fn promise_resolve_thenable_job(
    realm: &Realm,
    promise: &JsPromise,
    thenable: &Value,
    then: &Value,
) -> JsResult<()> {
    let functions = create_resolving_functions(realm, promise);
    let completion = then.call(
        thenable,
        &[functions.resolve.clone(), functions.reject.clone()],
    );
    if let Err(exception) = completion {
        functions
            .reject
            .call(&Value::Undefined, &[exception.into_value()])?;
    }
    Ok(())
}
