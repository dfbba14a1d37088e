// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session lifecycle specs
//!
//! Verify a clean run produces a trace and leaves no scratch state behind.

use crate::prelude::*;

#[tokio::test]
#[serial]
async fn clean_exit_records_trace() {
    let sandbox = Sandbox::new();
    let tracer = sandbox.tracer(&[]);

    let results = tracer
        .fire(TracingOptions::default().timeout(Duration::from_secs(10)), Vec::<Vec<u8>>::new())
        .await
        .unwrap();

    assert!(!results.timed_out());
    assert_eq!(results.crashed(), Some(false));
    assert_eq!(results.base_address, Some(0x400000));
    let trace = results.trace.as_ref().unwrap();
    assert_eq!(trace.len(), 10);
    assert_eq!(trace.last(), Some(&0x401000));
    assert_eq!(results.relative_trace().unwrap().last(), Some(&0x1000));
    assert!(sandbox.leftover_scratch().is_empty());
}

#[tokio::test]
#[serial]
async fn testcases_reach_the_target() {
    let sandbox = Sandbox::new();
    let tracer = sandbox.tracer(&[]);

    let results = tracer
        .fire(TracingOptions::default(), ["GET / HTTP/1.0\r\n", "\r\n"])
        .await
        .unwrap();

    assert_eq!(results.stdout, b"GET / HTTP/1.0\r\n\r\n");
    assert!(sandbox.leftover_scratch().is_empty());
}

#[tokio::test]
#[serial]
async fn large_testcase_is_echoed_in_full() {
    let sandbox = Sandbox::new();
    let tracer = sandbox.tracer(&[]);

    let testcase = vec![b'A'; 1 << 20];
    let options = TracingOptions::default().timeout(Duration::from_secs(10));
    let fired = tokio::time::timeout(Duration::from_secs(15), tracer.fire(options, [&testcase]));
    let results = fired.await.expect("fire stays within its budget").unwrap();

    assert!(!results.timed_out());
    assert_eq!(results.stdout.len(), testcase.len());
    assert!(sandbox.leftover_scratch().is_empty());
}

#[tokio::test]
#[serial]
async fn snapshot_is_one_page() {
    let sandbox = Sandbox::new();
    let tracer = sandbox.tracer(&["STANDIN_BLOCKS=3"]);

    let options = TracingOptions::default().record_snapshot(true);
    let results = tracer.fire(options, Vec::<Vec<u8>>::new()).await.unwrap();

    assert_eq!(results.trace.map(|t| t.len()), Some(3));
    assert_eq!(results.snapshot.map(|s| s.len()), Some(PAGE_SIZE));
}

#[tokio::test]
#[serial]
async fn no_trace_requested() {
    let sandbox = Sandbox::new();
    let tracer = sandbox.tracer(&[]);

    let options = TracingOptions::default().record_trace(false);
    let results = tracer.fire(options, Vec::<Vec<u8>>::new()).await.unwrap();

    assert_eq!(results.outcome, Outcome::Exited { returncode: ReturnCode(0), fault: None });
    assert_eq!(results.trace, None);
    assert_eq!(results.base_address, None);
}

#[tokio::test]
#[serial]
async fn missing_launcher_is_a_target_error() {
    let sandbox = Sandbox::new();
    std::fs::remove_file(sandbox.path().join("fire")).unwrap();
    let tracer = sandbox.tracer(&[]);

    let err = match tracer.start(TracingOptions::default()).await {
        Ok(_) => panic!("launcher is gone"),
        Err(e) => e,
    };
    assert!(matches!(err, TracerError::Target(_)));
    assert!(sandbox.leftover_scratch().is_empty());
}
