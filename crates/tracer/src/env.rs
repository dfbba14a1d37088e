// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the tracer crate.

use std::path::PathBuf;
use std::time::Duration;

/// Emulator launcher override (`EMUTRACE_LAUNCHER`)
pub fn launcher() -> Option<String> {
    std::env::var("EMUTRACE_LAUNCHER").ok().filter(|s| !s.is_empty())
}

/// Scratch root inside the execution environment (`EMUTRACE_SCRATCH_ROOT`)
pub fn scratch_root() -> Option<String> {
    std::env::var("EMUTRACE_SCRATCH_ROOT").ok().filter(|s| !s.is_empty())
}

/// Local directory for retrieved core files (`EMUTRACE_LOCAL_TMP`)
pub fn local_tmp() -> Option<PathBuf> {
    std::env::var("EMUTRACE_LOCAL_TMP").ok().filter(|s| !s.is_empty()).map(PathBuf::from)
}

/// Per-artifact retrieval bound (`EMUTRACE_RETRIEVE_TIMEOUT_MS`)
pub fn retrieve_timeout() -> Option<Duration> {
    std::env::var("EMUTRACE_RETRIEVE_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}
