// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Adapters for the environments a traced program runs in

pub mod docker;
pub mod local;
pub mod target;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
pub mod fake;

pub use docker::DockerTarget;
pub use local::{LocalProcess, LocalTarget};
pub use target::{
    ExecutionTarget, ProcessExit, RunOptions, StdioMode, TargetError, TargetProcess,
};

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeOutput, FakeRun, FakeTarget, TargetCall};
