//! Async runtime for JavaScript execution.
//!
//! This crate provides the promise and job machinery of the engine:
//! - Realms owning intrinsics, job queues and the execution-context stack
//! - Promise objects, resolving functions, capabilities and reactions
//! - `Promise.all` / `race` / `allSettled` / `any`
//! - The async function driver that suspends on `await`
//! - An event loop with a cross-thread host inbox
//!
//! # Overview
//!
//! - [`Realm`] - Per-instance owner of the job queues
//! - [`JsPromise`] - Promise object handle
//! - [`PromiseCapability`] - `{promise, resolve, reject}` from any constructor
//! - [`async_function_start`] - Runs a [`Coroutine`] as an async function
//! - [`EventLoop`] - Task queue plus host inbox on top of a realm
//!
//! # Examples
//!
//! ## Chaining
//!
//! ```
//! use async_runtime::{JsPromise, PromiseState, Realm};
//! use core_types::{JsObject, Value};
//!
//! let realm = Realm::new();
//! let promise_ctor = Value::Object(realm.promise_constructor());
//! let resolved = promise_ctor.invoke("resolve", &[Value::Smi(20)]).unwrap();
//!
//! let double = JsObject::function("double", |_this, args| {
//!     let n = args[0].as_number().unwrap_or(0.0);
//!     Ok(Value::Double(n * 2.0))
//! });
//! let chained = resolved.invoke("then", &[Value::Object(double)]).unwrap();
//!
//! let chained = JsPromise::from_value(&chained).unwrap();
//! assert_eq!(chained.state(), PromiseState::Pending);
//! realm.run_jobs().unwrap();
//! assert_eq!(chained.result(), Value::Smi(40));
//! ```
//!
//! ## Async functions
//!
//! ```
//! use async_runtime::{async_function_start, CoroutineStep, JsPromise, Realm, ResumeCompletion};
//! use core_types::Value;
//!
//! let realm = Realm::new();
//! let mut awaited = false;
//! let promise = async_function_start(&realm, "f", move |_realm: &Realm, resumed: ResumeCompletion| {
//!     if !awaited {
//!         awaited = true;
//!         return Ok(CoroutineStep::Await(Value::Smi(1)));
//!     }
//!     match resumed {
//!         ResumeCompletion::Normal(v) => Ok(CoroutineStep::Complete(v)),
//!         ResumeCompletion::Throw(e) => Err(core_types::Exception::new(e)),
//!     }
//! })
//! .unwrap();
//!
//! realm.run_jobs().unwrap();
//! assert_eq!(JsPromise::from_value(&promise).unwrap().result(), Value::Smi(1));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod async_function;
pub mod builtins;
pub mod capability;
pub mod combinators;
pub mod config;
pub mod coroutine;
pub mod error;
pub mod event_loop;
pub mod iterator;
pub mod job_queue;
pub mod promise;
pub mod promise_jobs;
pub mod reaction;
pub mod realm;
pub mod rejection;
pub mod resolving;

// Re-export main types at crate root
pub use async_function::{async_function_start, await_value, AsyncFunctionDriver};
pub use builtins::promise_resolve;
pub use capability::{new_promise_capability, PromiseCapability};
pub use config::RuntimeConfig;
pub use coroutine::{Coroutine, CoroutineStep, ResumeCompletion};
pub use error::RuntimeError;
pub use event_loop::{EventLoop, HostSender, HostTask, Task};
pub use iterator::{get_iterator, iterator_close, iterator_step, iterator_value, IteratorRecord};
pub use job_queue::{Job, JobQueue, QueueType};
pub use promise::{JsPromise, PromiseState};
pub use promise_jobs::{promise_reaction_job, promise_resolve_thenable_job};
pub use reaction::{perform_promise_then, PromiseReaction, ReactionHandler, ReactionType};
pub use realm::{ContextGuard, ExecutionContext, Intrinsics, Realm, WeakRealm};
pub use rejection::{RejectionOperation, RejectionTracker};
pub use resolving::{create_resolving_functions, resolve_promise, ResolvingFunctions};
