// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scripted execution target for tests.
//!
//! Keeps an in-memory filesystem and plays back queued [`FakeRun`]s, one
//! per [`ExecutionTarget::run`] call. Files a run "produces" are placed
//! relative to flags on its command line, so a fake emulator can write its
//! trace to whatever path the tracer passed after `-D`.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use emutrace_core::{ReturnCode, TargetMetadata};
use parking_lot::Mutex;
use tokio::time::Instant;

use crate::target::{
    ExecutionTarget, ProcessExit, RunOptions, StdioMode, TargetError, TargetProcess,
};

/// Recorded target operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetCall {
    Run { args: Vec<String> },
    ResolveGlob { pattern: String },
    RetrieveContents { path: String },
    RetrieveInto { remote_path: String, local_dir: String },
    MakeDir { path: String },
    RemoveDir { path: String },
}

/// A file a fake run writes when it exits.
#[derive(Debug, Clone)]
pub struct FakeOutput {
    /// Flag whose value locates the file
    pub flag: String,
    /// When set, the flag names a directory and this file is created in it
    pub file_name: Option<String>,
    pub contents: Vec<u8>,
}

/// Scripted behaviour for one process.
#[derive(Debug, Clone)]
pub struct FakeRun {
    /// `None` never exits on its own
    pub returncode: Option<ReturnCode>,
    /// Time the process takes before exiting
    pub runtime: Duration,
    pub outputs: Vec<FakeOutput>,
    pub stderr: Vec<u8>,
    pub spawn_error: bool,
}

impl FakeRun {
    pub fn exits(code: i32) -> Self {
        Self {
            returncode: Some(ReturnCode(code)),
            runtime: Duration::ZERO,
            outputs: Vec::new(),
            stderr: Vec::new(),
            spawn_error: false,
        }
    }

    /// A process that only stops when its budget runs out.
    pub fn hangs() -> Self {
        Self { returncode: None, ..Self::exits(0) }
    }

    /// `run` itself fails.
    pub fn spawn_fails() -> Self {
        Self { spawn_error: true, ..Self::exits(0) }
    }

    pub fn after(mut self, runtime: Duration) -> Self {
        self.runtime = runtime;
        self
    }

    /// Write `contents` to the path following `flag`.
    pub fn writes(mut self, flag: &str, contents: impl Into<Vec<u8>>) -> Self {
        self.outputs.push(FakeOutput {
            flag: flag.to_string(),
            file_name: None,
            contents: contents.into(),
        });
        self
    }

    /// Write `contents` to `file_name` inside the directory following `flag`.
    pub fn writes_in(mut self, flag: &str, file_name: &str, contents: impl Into<Vec<u8>>) -> Self {
        self.outputs.push(FakeOutput {
            flag: flag.to_string(),
            file_name: Some(file_name.to_string()),
            contents: contents.into(),
        });
        self
    }

    pub fn stderr(mut self, stderr: impl Into<Vec<u8>>) -> Self {
        self.stderr = stderr.into();
        self
    }
}

#[derive(Default)]
struct FakeTargetState {
    files: BTreeMap<String, Vec<u8>>,
    dirs: BTreeSet<String>,
    runs: VecDeque<FakeRun>,
    calls: Vec<TargetCall>,
    stdin: Vec<u8>,
    retrieve_delay: Duration,
}

/// Fake execution target for testing
#[derive(Clone)]
pub struct FakeTarget {
    metadata: TargetMetadata,
    inner: Arc<Mutex<FakeTargetState>>,
}

impl FakeTarget {
    pub fn new(metadata: TargetMetadata) -> Self {
        Self { metadata, inner: Arc::new(Mutex::new(FakeTargetState::default())) }
    }

    /// Queue the behaviour of the next started process.
    pub fn push_run(&self, run: FakeRun) {
        self.inner.lock().runs.push_back(run);
    }

    /// Place a file in the fake filesystem.
    pub fn put_file(&self, path: &str, contents: impl Into<Vec<u8>>) {
        self.inner.lock().files.insert(path.to_string(), contents.into());
    }

    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.inner.lock().files.get(path).cloned()
    }

    pub fn dirs(&self) -> Vec<String> {
        self.inner.lock().dirs.iter().cloned().collect()
    }

    /// Make every retrieval take `delay` before answering.
    pub fn slow_retrieval(&self, delay: Duration) {
        self.inner.lock().retrieve_delay = delay;
    }

    /// Everything written to the stdin of processes started so far.
    pub fn stdin(&self) -> Vec<u8> {
        self.inner.lock().stdin.clone()
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<TargetCall> {
        self.inner.lock().calls.clone()
    }

    fn record(&self, call: TargetCall) {
        self.inner.lock().calls.push(call);
    }

    async fn retrieval_delay(&self) {
        let delay = self.inner.lock().retrieve_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter().position(|a| a == flag).and_then(|i| args.get(i + 1)).map(String::as_str)
}

#[async_trait]
impl ExecutionTarget for FakeTarget {
    fn metadata(&self) -> &TargetMetadata {
        &self.metadata
    }

    async fn run(
        &self,
        args: &[String],
        opts: RunOptions,
    ) -> Result<Box<dyn TargetProcess>, TargetError> {
        self.record(TargetCall::Run { args: args.to_vec() });
        if args.is_empty() {
            return Err(TargetError::EmptyCommand);
        }
        let run = self.inner.lock().runs.pop_front().unwrap_or_else(|| FakeRun::exits(0));
        if run.spawn_error {
            return Err(TargetError::Spawn {
                program: args[0].clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "scripted spawn failure"),
            });
        }
        Ok(Box::new(FakeProcess {
            run,
            args: args.to_vec(),
            started: Instant::now(),
            deadline: Instant::now() + opts.timeout,
            capture: opts.stdout == StdioMode::Piped,
            stdin_open: opts.stdin == StdioMode::Piped,
            stdin: Vec::new(),
            waited: false,
            inner: Arc::clone(&self.inner),
        }))
    }

    async fn resolve_glob(&self, pattern: &str) -> Result<Vec<String>, TargetError> {
        self.record(TargetCall::ResolveGlob { pattern: pattern.to_string() });
        self.retrieval_delay().await;
        let matcher = glob::Pattern::new(pattern).map_err(|e| TargetError::Glob {
            pattern: pattern.to_string(),
            message: e.msg.to_string(),
        })?;
        // BTreeMap keys are already sorted
        Ok(self.inner.lock().files.keys().filter(|p| matcher.matches(p)).cloned().collect())
    }

    async fn retrieve_contents(&self, path: &str) -> Result<Vec<u8>, TargetError> {
        self.record(TargetCall::RetrieveContents { path: path.to_string() });
        self.retrieval_delay().await;
        self.file(path).ok_or_else(|| TargetError::NotFound(path.to_string()))
    }

    async fn retrieve_into(&self, remote_path: &str, local_dir: &Path) -> Result<(), TargetError> {
        self.record(TargetCall::RetrieveInto {
            remote_path: remote_path.to_string(),
            local_dir: local_dir.display().to_string(),
        });
        self.retrieval_delay().await;
        let contents =
            self.file(remote_path).ok_or_else(|| TargetError::NotFound(remote_path.to_string()))?;
        let name = Path::new(remote_path)
            .file_name()
            .ok_or_else(|| TargetError::NotFound(remote_path.to_string()))?;
        tokio::fs::write(local_dir.join(name), contents)
            .await
            .map_err(|e| TargetError::io("fake retrieve_into", e))
    }

    async fn make_dir(&self, path: &str) -> Result<(), TargetError> {
        self.record(TargetCall::MakeDir { path: path.to_string() });
        self.inner.lock().dirs.insert(path.to_string());
        Ok(())
    }

    async fn remove_dir(&self, path: &str) -> Result<(), TargetError> {
        self.record(TargetCall::RemoveDir { path: path.to_string() });
        let mut inner = self.inner.lock();
        inner.dirs.remove(path);
        let prefix = format!("{}/", path);
        inner.files.retain(|p, _| !p.starts_with(&prefix));
        Ok(())
    }
}

struct FakeProcess {
    run: FakeRun,
    args: Vec<String>,
    started: Instant,
    deadline: Instant,
    capture: bool,
    stdin_open: bool,
    stdin: Vec<u8>,
    waited: bool,
    inner: Arc<Mutex<FakeTargetState>>,
}

#[async_trait]
impl TargetProcess for FakeProcess {
    fn id(&self) -> Option<u32> {
        None
    }

    async fn write_stdin(&mut self, data: &[u8]) -> Result<(), TargetError> {
        if !self.stdin_open {
            return Err(TargetError::StdinClosed);
        }
        self.stdin.extend_from_slice(data);
        self.inner.lock().stdin.extend_from_slice(data);
        Ok(())
    }

    fn close_stdin(&mut self) {
        self.stdin_open = false;
    }

    async fn wait(&mut self) -> Result<ProcessExit, TargetError> {
        if self.waited {
            return Err(TargetError::AlreadyWaited);
        }
        self.waited = true;
        self.close_stdin();

        let finish = self.started + self.run.runtime;
        let returncode = match self.run.returncode {
            Some(code) if finish <= self.deadline => code,
            _ => {
                tokio::time::sleep_until(self.deadline).await;
                return Ok(ProcessExit::TimedOut);
            }
        };
        tokio::time::sleep_until(finish).await;

        let mut inner = self.inner.lock();
        for output in &self.run.outputs {
            let Some(base) = flag_value(&self.args, &output.flag) else {
                continue;
            };
            let path = match output.file_name {
                Some(ref name) => format!("{}/{}", base, name),
                None => base.to_string(),
            };
            inner.files.insert(path, output.contents.clone());
        }

        // Behaves like `cat`: whatever was fed in comes back out
        let stdout = if self.capture { std::mem::take(&mut self.stdin) } else { Vec::new() };
        let stderr = if self.capture { self.run.stderr.clone() } else { Vec::new() };
        Ok(ProcessExit::Exited { returncode, stdout, stderr })
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
