// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-invocation tracing options.

use std::time::Duration;

/// Default execution budget for a traced run.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// What a single traced execution should record.
///
/// Built by the caller and handed to the tracer by value; a running session
/// never changes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingOptions {
    /// Record the executed basic blocks
    pub record_trace: bool,
    /// Dump the emulator's fixed scratch page (CGC magic page)
    pub record_snapshot: bool,
    /// Keep the core file the emulator writes on a fault
    pub save_core: bool,
    /// Execution budget for the emulated process
    pub timeout: Duration,
    /// Seed for the emulator's randomness
    pub seed: Option<u64>,
    /// `LD_LIBRARY_PATH` forced into the target's environment
    pub library_path: Option<String>,
    /// Ask the emulator to report bad syscall arguments
    pub report_bad_args: bool,
}

impl Default for TracingOptions {
    fn default() -> Self {
        Self {
            record_trace: true,
            record_snapshot: false,
            save_core: false,
            timeout: DEFAULT_TIMEOUT,
            seed: None,
            library_path: None,
            report_bad_args: false,
        }
    }
}

impl TracingOptions {
    pub fn new() -> Self {
        Self::default()
    }

    crate::setters! {
        set {
            record_trace: bool,
            record_snapshot: bool,
            save_core: bool,
            timeout: Duration,
            report_bad_args: bool,
        }
        option {
            seed: u64,
            library_path: String,
        }
    }
}

#[cfg(test)]
#[path = "options_tests.rs"]
mod tests;
