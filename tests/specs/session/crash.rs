// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Crash classification specs

use crate::prelude::*;

async fn fire(
    sandbox: &Sandbox,
    env: &[&str],
    options: TracingOptions,
) -> emutrace_core::TraceResults {
    sandbox.tracer(env).fire(options, Vec::<Vec<u8>>::new()).await.unwrap()
}

#[tokio::test]
#[serial]
async fn segv_exit_code() {
    let sandbox = Sandbox::new();
    let results = fire(&sandbox, &["STANDIN_EXIT=139"], TracingOptions::default()).await;

    assert_eq!(results.fault_kind(), Some(FaultKind::SegmentationViolation));
    assert_eq!(results.fault_address, Some(0x401000));
    assert!(sandbox.leftover_scratch().is_empty());
}

#[tokio::test]
#[serial]
async fn segv_signal() {
    let sandbox = Sandbox::new();
    let results = fire(&sandbox, &["STANDIN_SIGNAL=SEGV"], TracingOptions::default()).await;

    assert_eq!(results.returncode(), Some(ReturnCode::signaled(11)));
    assert_eq!(results.fault_kind(), Some(FaultKind::SegmentationViolation));
    assert_eq!(results.fault_address, results.trace.as_ref().and_then(|t| t.last().copied()));
}

#[tokio::test]
#[serial]
async fn illegal_instruction_exit_code() {
    let sandbox = Sandbox::new();
    let results = fire(&sandbox, &["STANDIN_EXIT=132"], TracingOptions::default()).await;

    assert_eq!(results.fault_kind(), Some(FaultKind::IllegalInstruction));
    assert_eq!(results.fault_address, Some(0x401000));
}

#[tokio::test]
#[serial]
async fn ordinary_failure_is_not_a_crash() {
    let sandbox = Sandbox::new();
    let results = fire(&sandbox, &["STANDIN_EXIT=1"], TracingOptions::default()).await;

    assert_eq!(results.crashed(), Some(false));
    assert_eq!(results.fault_address, None);
}

#[tokio::test]
#[serial]
async fn crash_with_empty_trace_fails() {
    let sandbox = Sandbox::new();
    let err = sandbox
        .tracer(&["STANDIN_EXIT=139", "STANDIN_BLOCKS=0"])
        .fire(TracingOptions::default(), Vec::<Vec<u8>>::new())
        .await
        .unwrap_err();

    assert!(matches!(err, TracerError::CrashWithoutTrace));
    assert!(sandbox.leftover_scratch().is_empty());
}

#[tokio::test]
#[serial]
async fn core_file_is_kept() {
    let sandbox = Sandbox::new();
    let options = TracingOptions::default().save_core(true);
    let results = fire(&sandbox, &["STANDIN_EXIT=139", "STANDIN_CORE=1"], options).await;

    let core = results.core_path.as_ref().unwrap();
    assert!(core.starts_with(sandbox.cores()));
    assert_eq!(std::fs::read(core).unwrap(), b"CORE");
    assert!(sandbox.leftover_scratch().is_empty());
}

#[tokio::test]
#[serial]
async fn missing_core_file_fails() {
    let sandbox = Sandbox::new();
    let err = sandbox
        .tracer(&["STANDIN_EXIT=139"])
        .fire(TracingOptions::default().save_core(true), Vec::<Vec<u8>>::new())
        .await
        .unwrap_err();

    assert!(matches!(err, TracerError::CoreDumpCount { found: 0, .. }));
    assert!(sandbox.leftover_scratch().is_empty());
}
