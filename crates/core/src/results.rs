// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The record a tracing session publishes when it closes.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::id::SessionId;
use crate::status::{FaultKind, ReturnCode};

/// Size of the emulator's scratch-memory snapshot: one page.
pub const PAGE_SIZE: usize = 0x1000;

/// How the supervised process concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// The execution budget elapsed and the process was stopped.
    TimedOut,
    /// The process terminated on its own.
    Exited {
        returncode: ReturnCode,
        /// Fault the return code maps to, if any
        fault: Option<FaultKind>,
    },
}

/// Everything a tracing session learned about one execution.
///
/// Process fields are filled first, artifact fields after the process is
/// confirmed not to have timed out. The record is only handed out once the
/// session has closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceResults {
    pub session: SessionId,
    pub outcome: Outcome,
    /// Captured standard output (empty when not captured or timed out)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stdout: Vec<u8>,
    /// Captured standard error (empty when not captured or timed out)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stderr: Vec<u8>,
    /// Executed basic-block addresses in execution order
    pub trace: Option<Vec<u64>>,
    /// Address the loader mapped the target's code at
    pub base_address: Option<u64>,
    /// Last traced address of a crashing run
    pub fault_address: Option<u64>,
    /// Scratch page dump, exactly [`PAGE_SIZE`] bytes
    pub snapshot: Option<Vec<u8>>,
    /// Local path of the retrieved core file
    pub core_path: Option<PathBuf>,
}

impl TraceResults {
    /// A record for a session whose process concluded with `outcome` and
    /// whose artifacts have not been collected yet.
    pub fn new(session: SessionId, outcome: Outcome) -> Self {
        Self {
            session,
            outcome,
            stdout: Vec::new(),
            stderr: Vec::new(),
            trace: None,
            base_address: None,
            fault_address: None,
            snapshot: None,
            core_path: None,
        }
    }

    pub fn timed_out(&self) -> bool {
        matches!(self.outcome, Outcome::TimedOut)
    }

    /// Raw return code; `None` when the process timed out.
    pub fn returncode(&self) -> Option<ReturnCode> {
        match self.outcome {
            Outcome::Exited { returncode, .. } => Some(returncode),
            Outcome::TimedOut => None,
        }
    }

    /// Fault the process died from, if it crashed.
    pub fn fault_kind(&self) -> Option<FaultKind> {
        match self.outcome {
            Outcome::Exited { fault, .. } => fault,
            Outcome::TimedOut => None,
        }
    }

    /// Whether the process crashed; `None` when it timed out and the
    /// question has no answer.
    pub fn crashed(&self) -> Option<bool> {
        match self.outcome {
            Outcome::Exited { fault, .. } => Some(fault.is_some()),
            Outcome::TimedOut => None,
        }
    }

    /// Trace addresses relative to the load base, for position-independent
    /// comparison across runs.
    pub fn relative_trace(&self) -> Option<Vec<u64>> {
        let base = self.base_address?;
        let trace = self.trace.as_ref()?;
        Some(trace.iter().map(|addr| addr.wrapping_sub(base)).collect())
    }
}

#[cfg(test)]
#[path = "results_tests.rs"]
mod tests;
