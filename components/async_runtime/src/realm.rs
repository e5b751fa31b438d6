//! Realms: the per-instance owner of intrinsics, job queues and the
//! execution-context stack.
//!
//! Nothing here is global. Two realms never share a queue, and a realm is
//! explicitly torn down with [`Realm::teardown`].

use crate::builtins::create_promise_intrinsics;
use crate::config::RuntimeConfig;
use crate::error::RuntimeError;
use crate::iterator::create_array_prototype;
use crate::job_queue::{Job, JobQueue, QueueType};
use crate::promise::JsPromise;
use crate::rejection::{log_rejection, RejectionOperation, RejectionTracker};
use core_types::{JsError, JsObject, JsResult, Value};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::{debug, trace, warn};

/// Well-known objects of a realm.
#[derive(Debug, Clone)]
pub struct Intrinsics {
    /// `%Object.prototype%`
    pub object_prototype: JsObject,
    /// `%Array.prototype%`
    pub array_prototype: JsObject,
    /// `%Promise%`
    pub promise_constructor: JsObject,
    /// `%Promise.prototype%`
    pub promise_prototype: JsObject,
}

impl Intrinsics {
    fn create(realm: &WeakRealm) -> Self {
        let object_prototype = JsObject::ordinary(None);
        let array_prototype = create_array_prototype(realm, &object_prototype);
        let (promise_constructor, promise_prototype) =
            create_promise_intrinsics(realm, &object_prototype);
        Self {
            object_prototype,
            array_prototype,
            promise_constructor,
            promise_prototype,
        }
    }
}

/// An entry on the execution-context stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionContext {
    /// Realm-unique identifier
    pub id: usize,
    /// Diagnostic name (usually the function name)
    pub name: String,
}

/// Pops the execution-context stack back to its depth at creation.
#[must_use = "the context is left as soon as the guard is dropped"]
pub struct ContextGuard {
    realm: Realm,
    depth: usize,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        self.realm.0.contexts.borrow_mut().truncate(self.depth);
    }
}

struct RealmRecord {
    config: RuntimeConfig,
    intrinsics: Intrinsics,
    jobs: RefCell<JobQueue>,
    contexts: RefCell<Vec<ExecutionContext>>,
    next_context_id: Cell<usize>,
    rejection_tracker: RefCell<Option<RejectionTracker>>,
    torn_down: Cell<bool>,
}

/// Handle to a realm. Cloning shares the same realm.
#[derive(Clone)]
pub struct Realm(Rc<RealmRecord>);

/// Non-owning realm handle held by built-in functions.
#[derive(Clone)]
pub struct WeakRealm(Weak<RealmRecord>);

impl WeakRealm {
    /// Upgrades to a strong handle, throwing if the realm is gone.
    pub fn upgrade(&self) -> JsResult<Realm> {
        self.0
            .upgrade()
            .map(Realm)
            .ok_or_else(|| JsError::internal("realm has been dropped").into())
    }
}

impl Default for Realm {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Realm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Realm")
            .field("pending_jobs", &self.pending_job_count())
            .field("context_depth", &self.context_depth())
            .field("torn_down", &self.is_torn_down())
            .finish()
    }
}

impl Realm {
    /// Creates a realm with the default configuration.
    pub fn new() -> Self {
        Self::build(RuntimeConfig::default())
    }

    /// Creates a realm after validating `config`.
    pub fn with_config(config: RuntimeConfig) -> Result<Self, RuntimeError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: RuntimeConfig) -> Self {
        debug!(?config, "creating realm");
        Realm(Rc::new_cyclic(|weak| RealmRecord {
            config,
            intrinsics: Intrinsics::create(&WeakRealm(weak.clone())),
            jobs: RefCell::new(JobQueue::new()),
            contexts: RefCell::new(Vec::new()),
            next_context_id: Cell::new(0),
            rejection_tracker: RefCell::new(None),
            torn_down: Cell::new(false),
        }))
    }

    /// The configuration this realm was created with.
    pub fn config(&self) -> &RuntimeConfig {
        &self.0.config
    }

    /// Returns a non-owning handle.
    pub fn downgrade(&self) -> WeakRealm {
        WeakRealm(Rc::downgrade(&self.0))
    }

    /// The realm's intrinsic objects.
    pub fn intrinsics(&self) -> &Intrinsics {
        &self.0.intrinsics
    }

    /// `%Promise%`
    pub fn promise_constructor(&self) -> JsObject {
        self.0.intrinsics.promise_constructor.clone()
    }

    /// `%Promise.prototype%`
    pub fn promise_prototype(&self) -> JsObject {
        self.0.intrinsics.promise_prototype.clone()
    }

    /// Creates an ordinary object inheriting from `%Object.prototype%`.
    pub fn create_object(&self) -> JsObject {
        JsObject::ordinary(Some(self.0.intrinsics.object_prototype.clone()))
    }

    /// CreateArrayFromList.
    pub fn create_array(&self, elements: Vec<Value>) -> Value {
        Value::Object(JsObject::array(
            elements,
            Some(self.0.intrinsics.array_prototype.clone()),
        ))
    }

    /// Creates an error object with `name` and `message` properties.
    pub fn create_error(&self, error: JsError) -> Value {
        let name = error.kind.name();
        let object = JsObject::error(error, Some(self.0.intrinsics.object_prototype.clone()));
        object.set("name", name);
        Value::Object(object)
    }

    /// CreateIterResultObject.
    pub fn create_iter_result(&self, value: Value, done: bool) -> Value {
        let result = self.create_object();
        result.set("value", value);
        result.set("done", done);
        Value::Object(result)
    }

    /// HostEnqueueJob: appends a job to one of the realm's queues.
    ///
    /// Jobs enqueued after teardown are dropped.
    pub fn enqueue_job(&self, queue: QueueType, job: Job) {
        if self.is_torn_down() {
            debug!(?queue, ?job, "dropping job enqueued after teardown");
            return;
        }
        trace!(?queue, ?job, "enqueue");
        self.0.jobs.borrow_mut().enqueue(queue, job);
    }

    /// Returns true if any job is queued.
    pub fn has_pending_jobs(&self) -> bool {
        !self.0.jobs.borrow().is_empty()
    }

    /// Number of queued jobs.
    pub fn pending_job_count(&self) -> usize {
        self.0.jobs.borrow().len()
    }

    /// Drains the job queues, promise jobs first, until both are empty.
    ///
    /// Jobs enqueued while draining run in the same call. A promise job that
    /// completes abruptly is reported and skipped; a script or host job that
    /// completes abruptly stops the drain with
    /// [`RuntimeError::UncaughtException`], leaving later jobs queued.
    ///
    /// Returns the number of jobs executed.
    pub fn run_jobs(&self) -> Result<usize, RuntimeError> {
        if self.is_torn_down() {
            return Err(RuntimeError::RealmTornDown);
        }
        let mut executed = 0;
        loop {
            if let Some(budget) = self.0.config.job_budget {
                let remaining = self.pending_job_count();
                if executed >= budget && remaining > 0 {
                    warn!(budget, remaining, "job budget exhausted");
                    return Err(RuntimeError::JobBudgetExceeded { budget, remaining });
                }
            }
            // The queue borrow must end before the job runs: jobs enqueue more jobs.
            let next = self.0.jobs.borrow_mut().dequeue();
            let Some((queue, job)) = next else {
                break;
            };
            trace!(?queue, ?job, "run");
            let outcome = job.run(self);
            executed += 1;
            if let Err(exception) = outcome {
                match queue {
                    QueueType::Promise => {
                        warn!(error = %exception, "promise job completed abruptly")
                    }
                    QueueType::Script => return Err(RuntimeError::UncaughtException(exception)),
                }
            }
        }
        debug!(executed, "job queues drained");
        Ok(executed)
    }

    /// Tears the realm down: queued jobs, the context stack and the rejection
    /// tracker are dropped and later drains fail.
    pub fn teardown(&self) {
        if self.0.torn_down.replace(true) {
            return;
        }
        let dropped = std::mem::take(&mut *self.0.jobs.borrow_mut());
        debug!(dropped_jobs = dropped.len(), "realm torn down");
        drop(dropped);
        self.0.contexts.borrow_mut().clear();
        self.0.rejection_tracker.borrow_mut().take();
    }

    /// Whether [`Realm::teardown`] has been called.
    pub fn is_torn_down(&self) -> bool {
        self.0.torn_down.get()
    }

    /// Allocates a fresh execution context record.
    pub fn new_execution_context(&self, name: &str) -> ExecutionContext {
        let id = self.0.next_context_id.get();
        self.0.next_context_id.set(id + 1);
        ExecutionContext {
            id,
            name: name.to_string(),
        }
    }

    /// Pushes `context` as the running execution context until the guard drops.
    pub fn enter_context(&self, context: ExecutionContext) -> ContextGuard {
        let mut contexts = self.0.contexts.borrow_mut();
        let depth = contexts.len();
        contexts.push(context);
        ContextGuard {
            realm: self.clone(),
            depth,
        }
    }

    /// The running execution context, if any.
    pub fn running_context(&self) -> Option<ExecutionContext> {
        self.0.contexts.borrow().last().cloned()
    }

    /// Depth of the execution-context stack.
    pub fn context_depth(&self) -> usize {
        self.0.contexts.borrow().len()
    }

    /// Installs the host rejection tracker, replacing the logging default.
    pub fn set_rejection_tracker<F>(&self, tracker: F)
    where
        F: Fn(&JsPromise, RejectionOperation) + 'static,
    {
        *self.0.rejection_tracker.borrow_mut() = Some(Rc::new(tracker));
    }

    /// HostPromiseRejectionTracker.
    pub(crate) fn track_rejection(&self, promise: &JsPromise, operation: RejectionOperation) {
        if !self.0.config.track_rejections {
            return;
        }
        let tracker = self.0.rejection_tracker.borrow().clone();
        match tracker {
            Some(tracker) => tracker(promise, operation),
            None => log_rejection(promise, operation),
        }
    }
}
