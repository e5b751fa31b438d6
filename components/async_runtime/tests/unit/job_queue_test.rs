//! Unit tests for the realm job queues

use crate::support::*;
use async_runtime::{Job, QueueType, Realm, RuntimeConfig, RuntimeError};
use core_types::{Exception, Value};
use std::cell::RefCell;
use std::rc::Rc;

fn push_job(log: &Log, label: &'static str) -> Job {
    let log = log.clone();
    Job::host(move |_| {
        log.borrow_mut().push(label.to_string());
        Ok(())
    })
}

#[test]
fn jobs_run_fifo_within_a_queue() {
    let realm = realm();
    let log = log();
    realm.enqueue_job(QueueType::Promise, push_job(&log, "a"));
    realm.enqueue_job(QueueType::Promise, push_job(&log, "b"));
    realm.enqueue_job(QueueType::Promise, push_job(&log, "c"));
    assert_eq!(realm.run_jobs().unwrap(), 3);
    assert_eq!(entries(&log), vec!["a", "b", "c"]);
}

#[test]
fn promise_jobs_preempt_script_jobs() {
    let realm = realm();
    let log = log();
    let inner = log.clone();
    realm.enqueue_job(
        QueueType::Script,
        Job::host(move |realm| {
            inner.borrow_mut().push("script1".to_string());
            realm.enqueue_job(QueueType::Promise, push_job(&inner, "promise-from-script"));
            Ok(())
        }),
    );
    realm.enqueue_job(QueueType::Script, push_job(&log, "script2"));
    realm.enqueue_job(QueueType::Promise, push_job(&log, "promise"));
    realm.run_jobs().unwrap();
    assert_eq!(
        entries(&log),
        vec!["promise", "script1", "promise-from-script", "script2"]
    );
}

#[test]
fn reentrant_enqueue_drains_in_same_call() {
    let realm = realm();
    let count = Rc::new(RefCell::new(0));
    fn chain(count: Rc<RefCell<i32>>, depth: i32) -> Job {
        Job::host(move |realm| {
            *count.borrow_mut() += 1;
            if depth > 0 {
                realm.enqueue_job(QueueType::Promise, chain(count.clone(), depth - 1));
            }
            Ok(())
        })
    }
    realm.enqueue_job(QueueType::Promise, chain(count.clone(), 9));
    assert_eq!(realm.run_jobs().unwrap(), 10);
    assert_eq!(*count.borrow(), 10);
    assert!(!realm.has_pending_jobs());
}

#[test]
fn failing_promise_job_does_not_stop_drain() {
    let realm = realm();
    let log = log();
    realm.enqueue_job(
        QueueType::Promise,
        Job::host(|_| Err(Exception::new(Value::from("job failed")))),
    );
    realm.enqueue_job(QueueType::Promise, push_job(&log, "after"));
    realm.run_jobs().unwrap();
    assert_eq!(entries(&log), vec!["after"]);
}

#[test]
fn failing_script_job_surfaces_and_keeps_rest_queued() {
    let realm = realm();
    let log = log();
    realm.enqueue_job(
        QueueType::Script,
        Job::host(|_| Err(Exception::new(Value::from("script failed")))),
    );
    realm.enqueue_job(QueueType::Script, push_job(&log, "later"));
    let err = realm.run_jobs().unwrap_err();
    match err {
        RuntimeError::UncaughtException(exception) => {
            assert_eq!(exception.value(), &Value::from("script failed"))
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(realm.pending_job_count(), 1);
    realm.run_jobs().unwrap();
    assert_eq!(entries(&log), vec!["later"]);
}

#[test]
fn job_budget_stops_drain() {
    init_tracing();
    let realm = Realm::with_config(RuntimeConfig::default().with_job_budget(2)).unwrap();
    let log = log();
    for label in ["1", "2", "3"] {
        realm.enqueue_job(QueueType::Promise, push_job(&log, label));
    }
    let err = realm.run_jobs().unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::JobBudgetExceeded {
            budget: 2,
            remaining: 1
        }
    ));
    assert_eq!(entries(&log), vec!["1", "2"]);
    assert_eq!(realm.run_jobs().unwrap(), 1);
}

#[test]
fn realms_do_not_share_queues() {
    let first = realm();
    let second = Realm::new();
    let log = log();
    first.enqueue_job(QueueType::Promise, push_job(&log, "first"));
    assert!(!second.has_pending_jobs());
    assert_eq!(second.run_jobs().unwrap(), 0);
    assert!(entries(&log).is_empty());
}

#[test]
fn invalid_config_is_rejected() {
    let err = Realm::with_config(RuntimeConfig::default().with_job_budget(0)).unwrap_err();
    assert!(matches!(err, RuntimeError::InvalidConfig(_)));
}
