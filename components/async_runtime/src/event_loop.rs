//! Event loop implementation.
//!
//! The event loop owns the macrotask queue of one realm and a bounded inbox
//! that other threads post into. Only the thread driving the loop ever touches
//! promise state: posted work is turned into ordinary tasks on that thread.

use crate::error::RuntimeError;
use crate::job_queue::{Job, QueueType};
use crate::realm::Realm;
use core_types::JsResult;
use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use std::collections::VecDeque;
use std::fmt;
use tracing::{debug, trace};

/// A macrotask: runs once, followed by a full job-queue drain.
pub struct Task {
    callback: Box<dyn FnOnce(&Realm) -> JsResult<()>>,
}

impl Task {
    /// Creates a new Task from a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(&Realm) -> JsResult<()> + 'static,
    {
        Self {
            callback: Box::new(f),
        }
    }

    /// Executes the task.
    pub fn run(self, realm: &Realm) -> JsResult<()> {
        (self.callback)(realm)
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Task {{ ... }}")
    }
}

/// Work posted from another thread. It may not capture JavaScript values,
/// which are bound to the loop's thread.
pub type HostTask = Box<dyn FnOnce(&Realm) -> JsResult<()> + Send>;

/// Cloneable, `Send` handle for posting work into an [`EventLoop`].
#[derive(Clone)]
pub struct HostSender {
    sender: Sender<HostTask>,
}

impl HostSender {
    /// Posts a task, blocking while the inbox is full.
    pub fn post<F>(&self, f: F) -> Result<(), RuntimeError>
    where
        F: FnOnce(&Realm) -> JsResult<()> + Send + 'static,
    {
        self.sender
            .send(Box::new(f))
            .map_err(|_| RuntimeError::EventLoopClosed)
    }

    /// Posts a task without blocking.
    pub fn try_post<F>(&self, f: F) -> Result<(), RuntimeError>
    where
        F: FnOnce(&Realm) -> JsResult<()> + Send + 'static,
    {
        self.sender.try_send(Box::new(f)).map_err(|err| match err {
            TrySendError::Full(_) => RuntimeError::HostInboxFull,
            TrySendError::Disconnected(_) => RuntimeError::EventLoopClosed,
        })
    }
}

impl fmt::Debug for HostSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostSender")
            .field("queued", &self.sender.len())
            .finish()
    }
}

/// The JavaScript event loop.
///
/// Each turn takes the oldest task, runs it, then drains the realm's job
/// queues completely.
///
/// # Examples
///
/// ```
/// use async_runtime::{EventLoop, Realm, Task};
///
/// let mut event_loop = EventLoop::new(Realm::new());
/// event_loop.enqueue_task(Task::new(|_realm| Ok(())));
/// event_loop.run_until_done().unwrap();
/// ```
pub struct EventLoop {
    realm: Realm,
    tasks: VecDeque<Task>,
    inbox: Receiver<HostTask>,
    sender: Sender<HostTask>,
}

impl EventLoop {
    /// Creates an event loop for `realm`, sizing the inbox from its configuration.
    pub fn new(realm: Realm) -> Self {
        let (sender, inbox) = channel::bounded(realm.config().host_inbox_capacity.max(1));
        Self {
            realm,
            tasks: VecDeque::new(),
            inbox,
            sender,
        }
    }

    /// The realm this loop drives.
    pub fn realm(&self) -> &Realm {
        &self.realm
    }

    /// A handle other threads can post tasks through.
    pub fn host_sender(&self) -> HostSender {
        HostSender {
            sender: self.sender.clone(),
        }
    }

    /// Adds a task to the task queue.
    pub fn enqueue_task(&mut self, task: Task) {
        self.tasks.push_back(task);
    }

    /// Adds a job to the realm's job queue.
    pub fn enqueue_job(&self, queue: QueueType, job: Job) {
        self.realm.enqueue_job(queue, job);
    }

    /// Returns true if the task queue is empty.
    pub fn is_task_queue_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Moves everything posted to the inbox onto the task queue.
    fn accept_host_tasks(&mut self) -> usize {
        let mut accepted = 0;
        while let Ok(host_task) = self.inbox.try_recv() {
            self.tasks.push_back(Task { callback: host_task });
            accepted += 1;
        }
        if accepted > 0 {
            trace!(accepted, "accepted host tasks");
        }
        accepted
    }

    /// Processes one complete cycle: one task followed by all jobs.
    ///
    /// Returns whether a task was run.
    pub fn process_one_cycle(&mut self) -> Result<bool, RuntimeError> {
        self.accept_host_tasks();
        let ran_task = match self.tasks.pop_front() {
            Some(task) => {
                task.run(&self.realm)?;
                true
            }
            None => false,
        };
        self.realm.run_jobs()?;
        Ok(ran_task)
    }

    /// Runs the event loop until no task, posted host task or job remains.
    pub fn run_until_done(&mut self) -> Result<(), RuntimeError> {
        let mut turns = 0usize;
        loop {
            self.accept_host_tasks();
            if self.tasks.is_empty() && !self.realm.has_pending_jobs() {
                break;
            }
            self.process_one_cycle()?;
            turns += 1;
        }
        debug!(turns, "event loop idle");
        Ok(())
    }
}

impl fmt::Debug for EventLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLoop")
            .field("tasks", &self.tasks.len())
            .field("inbox", &self.inbox.len())
            .field("realm", &self.realm)
            .finish()
    }
}
