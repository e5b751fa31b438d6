//! Unit test runner for async_runtime
//! This file makes cargo test discover the unit test modules

mod support;

mod job_queue_test;
mod promise_test;
mod then_test;
