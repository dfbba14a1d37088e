// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution target interface.
//!
//! An execution target is wherever the emulator actually runs: the local
//! host, a container, a remote machine. The tracer never touches that
//! environment directly; it launches processes, resolves globs and pulls
//! files back through these traits.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use emutrace_core::{ReturnCode, TargetMetadata};
use thiserror::Error;

/// Errors from execution target operations
#[derive(Debug, Error)]
pub enum TargetError {
    #[error("refusing to run an empty command")]
    EmptyCommand,
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid glob pattern `{pattern}`: {message}")]
    Glob { pattern: String, message: String },
    #[error("`{command}` failed: {stderr}")]
    Command { command: String, stderr: String },
    #[error("stdin of the target process is closed")]
    StdinClosed,
    #[error("target process was already waited on")]
    AlreadyWaited,
}

impl TargetError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        TargetError::Io { context: context.into(), source }
    }
}

/// How one of the process's standard streams is wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdioMode {
    Piped,
    Null,
    Inherit,
}

impl From<StdioMode> for std::process::Stdio {
    fn from(mode: StdioMode) -> Self {
        match mode {
            StdioMode::Piped => std::process::Stdio::piped(),
            StdioMode::Null => std::process::Stdio::null(),
            StdioMode::Inherit => std::process::Stdio::inherit(),
        }
    }
}

/// Parameters for starting a process in an execution target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub stdin: StdioMode,
    pub stdout: StdioMode,
    pub stderr: StdioMode,
    /// Budget measured from the moment the process is started
    pub timeout: Duration,
}

impl RunOptions {
    /// All three streams piped.
    pub fn piped(timeout: Duration) -> Self {
        Self {
            stdin: StdioMode::Piped,
            stdout: StdioMode::Piped,
            stderr: StdioMode::Piped,
            timeout,
        }
    }
}

/// How a process started through [`ExecutionTarget::run`] concluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessExit {
    Exited {
        returncode: ReturnCode,
        stdout: Vec<u8>,
        stderr: Vec<u8>,
    },
    /// The budget elapsed first; the process has been killed.
    TimedOut,
}

/// A live process inside an execution target.
#[async_trait]
pub trait TargetProcess: Send {
    /// OS process id, when the target exposes one.
    fn id(&self) -> Option<u32>;

    /// Write bytes to the process's standard input.
    ///
    /// Bounded by the process budget. A write still pending when the budget
    /// elapses closes stdin and fails with [`TargetError::StdinClosed`];
    /// [`wait`](Self::wait) then reports the timeout.
    async fn write_stdin(&mut self, data: &[u8]) -> Result<(), TargetError>;

    /// Close standard input so the process sees EOF. Idempotent.
    fn close_stdin(&mut self);

    /// Wait for the process to exit or for its budget to elapse.
    ///
    /// Closes stdin first. A process that outlives its budget is killed
    /// and reported as [`ProcessExit::TimedOut`], not as an error.
    async fn wait(&mut self) -> Result<ProcessExit, TargetError>;
}

/// Sandbox the emulator runs in.
#[async_trait]
pub trait ExecutionTarget: Send + Sync {
    /// What the target declares about the program under test.
    fn metadata(&self) -> &TargetMetadata;

    /// Start `args` inside the target. Returns as soon as the process is
    /// started; the budget in `opts` is enforced by [`TargetProcess::wait`].
    async fn run(
        &self,
        args: &[String],
        opts: RunOptions,
    ) -> Result<Box<dyn TargetProcess>, TargetError>;

    /// Resolve a glob pattern in the target's filesystem, sorted.
    async fn resolve_glob(&self, pattern: &str) -> Result<Vec<String>, TargetError>;

    /// Read a whole file from the target.
    async fn retrieve_contents(&self, path: &str) -> Result<Vec<u8>, TargetError>;

    /// Copy a file from the target into a local directory, keeping its name.
    async fn retrieve_into(&self, remote_path: &str, local_dir: &Path) -> Result<(), TargetError>;

    /// Create a directory (and parents) in the target.
    async fn make_dir(&self, path: &str) -> Result<(), TargetError>;

    /// Remove a directory and everything in it. Missing is not an error.
    async fn remove_dir(&self, path: &str) -> Result<(), TargetError>;
}
