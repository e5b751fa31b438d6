//! Host Integration Tests
//!
//! Event loop turns, cross-thread host tasks, configuration and realm
//! lifecycle.

use async_runtime::{EventLoop, PromiseState, Realm, RuntimeConfig, RuntimeError, Task};
use core_types::Value;
use integration_tests::{elements, promise, promise_ctor, realm, Deferred, Trace};
use std::cell::RefCell;
use std::thread;

#[test]
fn test_microtasks_drain_between_macrotasks() {
    let mut event_loop = EventLoop::new(realm());
    let trace = Trace::new();

    let t1 = trace.clone();
    event_loop.enqueue_task(Task::new(move |realm| {
        t1.push("task1");
        promise_ctor(realm)
            .invoke("resolve", &[Value::from("m")])?
            .invoke("then", &[t1.handler("micro")])?;
        Ok(())
    }));
    let t2 = trace.clone();
    event_loop.enqueue_task(Task::new(move |_realm| {
        t2.push("task2");
        Ok(())
    }));

    event_loop.run_until_done().unwrap();
    assert_eq!(trace.entries(), vec!["task1", "micro:m", "task2"]);
}

thread_local! {
    static RESOLVERS: RefCell<Vec<Value>> = RefCell::new(Vec::new());
}

/// Worker threads hand plain data to the loop; only the loop thread touches
/// promises.
#[test]
fn test_worker_results_resolve_promises_on_loop_thread() {
    let realm = realm();
    let mut event_loop = EventLoop::new(realm.clone());
    let deferreds: Vec<Deferred> = (0..3).map(|_| Deferred::new(&realm)).collect();
    RESOLVERS.with(|resolvers| {
        *resolvers.borrow_mut() = deferreds.iter().map(|d| d.resolve.clone()).collect();
    });
    let all = promise_ctor(&realm)
        .invoke(
            "all",
            &[realm.create_array(deferreds.iter().map(|d| d.promise.clone()).collect())],
        )
        .unwrap();

    let workers: Vec<_> = (0..3usize)
        .rev()
        .map(|index| {
            let sender = event_loop.host_sender();
            thread::spawn(move || {
                let computed = (index as i32 + 1) * 10;
                sender
                    .post(move |_realm| {
                        let resolve = RESOLVERS.with(|resolvers| resolvers.borrow()[index].clone());
                        resolve.call(&Value::Undefined, &[Value::Smi(computed)])?;
                        Ok(())
                    })
                    .unwrap();
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    event_loop.run_until_done().unwrap();
    assert_eq!(
        elements(&promise(&all).result()),
        vec![Value::Smi(10), Value::Smi(20), Value::Smi(30)]
    );
}

#[test]
fn test_job_budget_interrupts_long_chains() {
    let config = RuntimeConfig::from_json(r#"{ "job_budget": 2 }"#).unwrap();
    let realm = Realm::with_config(config).unwrap();
    let trace = Trace::new();
    promise_ctor(&realm)
        .invoke("resolve", &[Value::Smi(1)])
        .unwrap()
        .invoke("then", &[trace.handler("f")])
        .unwrap()
        .invoke("then", &[trace.handler("g")])
        .unwrap()
        .invoke("then", &[trace.handler("h")])
        .unwrap();

    let err = realm.run_jobs().unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::JobBudgetExceeded {
            budget: 2,
            remaining: 1
        }
    ));
    assert_eq!(trace.entries(), vec!["f:1", "g:1"]);

    assert_eq!(realm.run_jobs().unwrap(), 1);
    assert_eq!(trace.entries(), vec!["f:1", "g:1", "h:1"]);
}

#[test]
fn test_disabled_rejection_tracking_skips_tracker() {
    let realm = Realm::with_config(RuntimeConfig::default().without_rejection_tracking()).unwrap();
    let trace = Trace::new();
    let sink = trace.clone();
    realm.set_rejection_tracker(move |_promise, operation| sink.push(format!("{:?}", operation)));

    Deferred::new(&realm).reject("ignored");
    assert!(trace.entries().is_empty());
}

#[test]
fn test_teardown_discards_pending_work() {
    let realm = realm();
    let trace = Trace::new();
    let d = Deferred::new(&realm);
    d.promise.invoke("then", &[trace.handler("never")]).unwrap();
    d.resolve(1);
    assert!(realm.has_pending_jobs());

    realm.teardown();
    assert!(!realm.has_pending_jobs());
    assert!(matches!(realm.run_jobs(), Err(RuntimeError::RealmTornDown)));

    // Settling after teardown neither runs nor queues anything.
    let late = Deferred::new(&realm);
    late.promise.invoke("then", &[trace.handler("late")]).unwrap();
    late.resolve(2);
    assert_eq!(late.state(), PromiseState::Fulfilled);
    assert!(!realm.has_pending_jobs());
    assert!(trace.entries().is_empty());
}

#[test]
fn test_independent_realms_do_not_share_queues() {
    let first = realm();
    let second = Realm::new();
    promise_ctor(&first)
        .invoke("resolve", &[Value::Smi(1)])
        .unwrap()
        .invoke("then", &[integration_tests::returning(Value::Undefined)])
        .unwrap();
    assert!(first.has_pending_jobs());
    assert!(!second.has_pending_jobs());
}
