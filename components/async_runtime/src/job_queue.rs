//! Job queues.
//!
//! A realm owns two FIFO queues: promise jobs (reactions and thenable
//! resolution) and script jobs (host work). Draining always prefers the
//! promise queue, so every microtask enqueued by a running job executes before
//! the next script job.

use crate::promise::JsPromise;
use crate::promise_jobs::{promise_reaction_job, promise_resolve_thenable_job};
use crate::reaction::PromiseReaction;
use crate::realm::Realm;
use core_types::{JsResult, Value};
use std::collections::VecDeque;
use std::fmt;

/// Which queue a job belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueType {
    /// Promise reaction and thenable jobs
    Promise,
    /// Script evaluation and other host jobs
    Script,
}

/// A deferred unit of work.
pub enum Job {
    /// Run a reaction handler against a settled value.
    PromiseReaction {
        /// Reaction to run
        reaction: PromiseReaction,
        /// Fulfillment value or rejection reason
        argument: Value,
    },
    /// Call `then` on a thenable with fresh resolving functions for `promise`.
    ResolveThenable {
        /// Promise being resolved
        promise: JsPromise,
        /// The thenable it was resolved with
        thenable: Value,
        /// The thenable's `then` method, read once at resolve time
        then: Value,
    },
    /// Arbitrary host callback.
    Host(Box<dyn FnOnce(&Realm) -> JsResult<()>>),
}

impl Job {
    /// Wraps a host closure as a job.
    pub fn host<F>(f: F) -> Self
    where
        F: FnOnce(&Realm) -> JsResult<()> + 'static,
    {
        Job::Host(Box::new(f))
    }

    /// Runs the job body to completion.
    pub fn run(self, realm: &Realm) -> JsResult<()> {
        match self {
            Job::PromiseReaction { reaction, argument } => {
                promise_reaction_job(&reaction, argument)
            }
            Job::ResolveThenable {
                promise,
                thenable,
                then,
            } => promise_resolve_thenable_job(realm, &promise, &thenable, &then),
            Job::Host(f) => f(realm),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Job::PromiseReaction { .. } => "PromiseReactionJob",
            Job::ResolveThenable { .. } => "PromiseResolveThenableJob",
            Job::Host(_) => "HostJob",
        }
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Job({})", self.label())
    }
}

/// The pair of job queues owned by a realm.
#[derive(Debug, Default)]
pub struct JobQueue {
    promise_jobs: VecDeque<Job>,
    script_jobs: VecDeque<Job>,
}

impl JobQueue {
    /// Creates empty queues.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a job to the end of the given queue.
    pub fn enqueue(&mut self, queue: QueueType, job: Job) {
        match queue {
            QueueType::Promise => self.promise_jobs.push_back(job),
            QueueType::Script => self.script_jobs.push_back(job),
        }
    }

    /// Removes the next job, promise jobs first.
    pub fn dequeue(&mut self) -> Option<(QueueType, Job)> {
        if let Some(job) = self.promise_jobs.pop_front() {
            return Some((QueueType::Promise, job));
        }
        self.script_jobs
            .pop_front()
            .map(|job| (QueueType::Script, job))
    }

    /// Number of queued jobs across both queues.
    pub fn len(&self) -> usize {
        self.promise_jobs.len() + self.script_jobs.len()
    }

    /// Number of jobs queued on one queue.
    pub fn len_of(&self, queue: QueueType) -> usize {
        match queue {
            QueueType::Promise => self.promise_jobs.len(),
            QueueType::Script => self.script_jobs.len(),
        }
    }

    /// Returns true if both queues are empty.
    pub fn is_empty(&self) -> bool {
        self.promise_jobs.is_empty() && self.script_jobs.is_empty()
    }

    /// Drops every queued job.
    pub fn clear(&mut self) {
        self.promise_jobs.clear();
        self.script_jobs.clear();
    }
}
