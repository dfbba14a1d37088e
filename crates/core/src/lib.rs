// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! emutrace-core: shared vocabulary for emulator-driven execution tracing

pub mod macros;

pub mod id;
pub mod options;
pub mod results;
pub mod status;
pub mod target;

pub use id::SessionId;
pub use options::{TracingOptions, DEFAULT_TIMEOUT};
pub use results::{Outcome, TraceResults, PAGE_SIZE};
pub use status::{FaultKind, ReturnCode};
pub use target::{Arch, ConfigError, TargetMetadata, TargetOs};
