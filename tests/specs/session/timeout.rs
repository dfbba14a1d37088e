// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timeout specs
//!
//! A run that outlives its budget is a result, not an error.

use crate::prelude::*;

#[tokio::test]
#[serial]
async fn budget_overrun_is_reported() {
    let sandbox = Sandbox::new();
    let tracer = sandbox.tracer(&["STANDIN_SLEEP=5"]);

    let options = TracingOptions::default().timeout(Duration::from_millis(300));
    let started = std::time::Instant::now();
    let results = tracer.fire(options, Vec::<Vec<u8>>::new()).await.unwrap();

    assert!(started.elapsed() < Duration::from_secs(4));
    assert!(results.timed_out());
    assert_eq!(results.outcome, Outcome::TimedOut);
    assert_eq!(results.crashed(), None);
    assert_eq!(results.trace, None);
    assert_eq!(results.base_address, None);
    assert_eq!(results.fault_address, None);
    assert!(sandbox.leftover_scratch().is_empty());
}

#[tokio::test]
#[serial]
async fn unread_stdin_does_not_outlast_budget() {
    let sandbox = Sandbox::new();
    let tracer = sandbox.tracer(&["STANDIN_SLEEP=5"]);

    let options = TracingOptions::default().timeout(Duration::from_millis(500));
    let started = std::time::Instant::now();
    let fired = tokio::time::timeout(
        Duration::from_secs(15),
        tracer.fire(options, [vec![b'A'; 1 << 20], vec![b'B'; 16]]),
    );
    let results = fired.await.expect("fire stays within its budget").unwrap();

    assert!(started.elapsed() < Duration::from_secs(4));
    assert_eq!(results.outcome, Outcome::TimedOut);
    assert_eq!(results.trace, None);
    assert!(sandbox.leftover_scratch().is_empty());
}

#[tokio::test]
#[serial]
async fn dropped_session_cleans_up() {
    let sandbox = Sandbox::new();
    let tracer = sandbox.tracer(&["STANDIN_SLEEP=5"]);

    let session = tracer.start(TracingOptions::default()).await.unwrap();
    assert_eq!(sandbox.leftover_scratch().len(), 1);
    drop(session);

    let mut cleaned = false;
    for _ in 0..100 {
        if sandbox.leftover_scratch().is_empty() {
            cleaned = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(cleaned, "scratch dir should be removed after drop");
}
