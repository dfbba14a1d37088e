// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Exit status to fault mapping.

use emutrace_core::{FaultKind, ReturnCode};

/// `128 + SIGSEGV` from a shell, or the raw signal.
pub const SEGV_CODES: [i32; 2] = [139, -11];

/// `128 + SIGILL`, the raw signal, and the SIGKILL the emulator raises
/// when it hits an instruction it cannot translate.
pub const SIGILL_CODES: [i32; 3] = [132, -4, -9];

/// Map a return code to the fault it signals, if any.
pub fn classify(code: ReturnCode) -> Option<FaultKind> {
    if SEGV_CODES.contains(&code.raw()) {
        Some(FaultKind::SegmentationViolation)
    } else if SIGILL_CODES.contains(&code.raw()) {
        Some(FaultKind::IllegalInstruction)
    } else {
        None
    }
}

#[cfg(test)]
#[path = "classify_tests.rs"]
mod tests;
