// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tracer error types.

use std::path::PathBuf;
use std::time::Duration;

use emutrace_adapters::TargetError;
use emutrace_core::ConfigError;
use thiserror::Error;

/// Failures while parsing an emulator trace log.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// No `start_code` line: the emulator never reported where it loaded
    /// the target.
    #[error("trace log has no start_code line")]
    MissingBase,
    #[error("malformed start_code line: {line}")]
    InvalidBase { line: String },
    #[error("malformed trace entry on line {line_no}: {line}")]
    InvalidTraceLine { line_no: usize, line: String },
}

/// Errors that abort a tracing session.
///
/// A timeout is not among them: it is an outcome recorded on the result.
#[derive(Debug, Error)]
pub enum TracerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Target(#[from] TargetError),

    #[error("expected 1 core file matching {pattern} but found {found}")]
    CoreDumpCount { pattern: String, found: usize },

    #[error("snapshot is {actual} bytes, expected a {expected}-byte page")]
    SnapshotSize { expected: usize, actual: usize },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("process crashed but the trace has no blocks to take a fault address from")]
    CrashWithoutTrace,

    #[error("retrieving {path} took longer than {timeout:?}")]
    RetrieveTimeout { path: String, timeout: Duration },

    #[error("failed to load config {path}: {message}")]
    InvalidConfig { path: PathBuf, message: String },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl TracerError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        TracerError::Io { context: context.into(), source }
    }
}
