// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process termination status and fault kinds.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Raw termination status of a process in signed form.
///
/// Non-negative values are exit codes. Negative values are `-signo` for a
/// process killed by a signal. Shells and container runtimes report signal
/// deaths of their children as `128 + signo` exit codes, so both spellings
/// of the same fault occur in practice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReturnCode(pub i32);

impl ReturnCode {
    pub fn exited(code: i32) -> Self {
        Self(code)
    }

    pub fn signaled(signo: i32) -> Self {
        Self(-signo)
    }

    pub fn raw(&self) -> i32 {
        self.0
    }

    /// Exit code, if the process exited normally.
    pub fn exit_code(&self) -> Option<i32> {
        (self.0 >= 0).then_some(self.0)
    }

    /// Signal number, if the process was killed by a signal.
    pub fn signal(&self) -> Option<i32> {
        (self.0 < 0).then_some(-self.0)
    }

    pub fn success(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.signal() {
            Some(signo) => write!(f, "signal {}", signo),
            None => write!(f, "exit {}", self.0),
        }
    }
}

/// Kind of memory-safety fault the target died from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    SegmentationViolation,
    IllegalInstruction,
}

impl FaultKind {
    /// Conventional signal name for this fault.
    pub fn signal_name(&self) -> &'static str {
        match self {
            FaultKind::SegmentationViolation => "SIGSEGV",
            FaultKind::IllegalInstruction => "SIGILL",
        }
    }
}

crate::simple_display! {
    FaultKind {
        SegmentationViolation => "segmentation violation",
        IllegalInstruction => "illegal instruction",
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
