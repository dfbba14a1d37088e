// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Host execution target: processes and files on the machine running the
//! tracer.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use emutrace_core::{ReturnCode, TargetMetadata};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, Command};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::target::{ExecutionTarget, ProcessExit, RunOptions, TargetError, TargetProcess};

/// Background reader that keeps a child's output pipe from filling up.
///
/// Aborted on drop, so an orphaned grandchild holding the pipe open cannot
/// keep the task alive past its process.
struct OutputDrain(JoinHandle<Vec<u8>>);

impl OutputDrain {
    fn start<R>(program: &str, stream: &'static str, reader: Option<R>) -> Option<Self>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let mut reader = reader?;
        let program = program.to_string();
        Some(Self(tokio::spawn(async move {
            let mut buf = Vec::new();
            if let Err(e) = reader.read_to_end(&mut buf).await {
                tracing::debug!(program = %program, stream, error = %e, "output read failed");
            }
            buf
        })))
    }

    /// Everything read so far, once the writer side has closed.
    async fn collect(drain: Option<Self>) -> Vec<u8> {
        match drain {
            Some(mut drain) => (&mut drain.0).await.unwrap_or_default(),
            None => Vec::new(),
        }
    }
}

impl Drop for OutputDrain {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// A child process on the host with a fixed deadline.
///
/// The child is spawned with `kill_on_drop`, so abandoning the wait when the
/// deadline passes kills it. Piped stdout and stderr are drained from spawn
/// onward, and stdin writes share the same deadline.
pub struct LocalProcess {
    program: String,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stdout: Option<OutputDrain>,
    stderr: Option<OutputDrain>,
    pid: Option<u32>,
    deadline: Instant,
}

impl LocalProcess {
    /// Spawn `command`, starting the budget clock now.
    pub(crate) fn spawn(
        program: &str,
        mut command: Command,
        opts: RunOptions,
    ) -> Result<Self, TargetError> {
        command
            .stdin(Stdio::from(opts.stdin))
            .stdout(Stdio::from(opts.stdout))
            .stderr(Stdio::from(opts.stderr))
            .kill_on_drop(true);

        let mut child = command
            .spawn()
            .map_err(|source| TargetError::Spawn { program: program.to_string(), source })?;
        let deadline = Instant::now() + opts.timeout;
        let pid = child.id();
        let stdin = child.stdin.take();
        let stdout = OutputDrain::start(program, "stdout", child.stdout.take());
        let stderr = OutputDrain::start(program, "stderr", child.stderr.take());

        tracing::debug!(
            program,
            pid = ?pid,
            timeout_ms = opts.timeout.as_millis() as u64,
            "process started"
        );

        Ok(Self {
            program: program.to_string(),
            child: Some(child),
            stdin,
            stdout,
            stderr,
            pid,
            deadline,
        })
    }
}

#[async_trait]
impl TargetProcess for LocalProcess {
    fn id(&self) -> Option<u32> {
        self.pid
    }

    async fn write_stdin(&mut self, data: &[u8]) -> Result<(), TargetError> {
        let stdin = self.stdin.as_mut().ok_or(TargetError::StdinClosed)?;
        let write = async {
            stdin.write_all(data).await?;
            stdin.flush().await
        };
        let result = tokio::time::timeout_at(self.deadline, write).await;
        match result {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(stdin_error(&self.program, e)),
            Err(_) => {
                tracing::debug!(
                    program = %self.program,
                    pid = ?self.pid,
                    "deadline elapsed while writing stdin"
                );
                self.close_stdin();
                Err(TargetError::StdinClosed)
            }
        }
    }

    fn close_stdin(&mut self) {
        // Dropping the handle closes the pipe
        self.stdin.take();
    }

    async fn wait(&mut self) -> Result<ProcessExit, TargetError> {
        let mut child = self.child.take().ok_or(TargetError::AlreadyWaited)?;
        self.close_stdin();
        let stdout = self.stdout.take();
        let stderr = self.stderr.take();

        let finished = async {
            let status = child.wait().await?;
            let stdout = OutputDrain::collect(stdout).await;
            let stderr = OutputDrain::collect(stderr).await;
            Ok::<_, std::io::Error>((status, stdout, stderr))
        };

        match tokio::time::timeout_at(self.deadline, finished).await {
            Ok(Ok((status, stdout, stderr))) => {
                let returncode = return_code(status);
                tracing::debug!(program = %self.program, %returncode, "process exited");
                Ok(ProcessExit::Exited { returncode, stdout, stderr })
            }
            Ok(Err(e)) => Err(TargetError::io(format!("failed to wait on `{}`", self.program), e)),
            Err(_) => {
                tracing::debug!(
                    program = %self.program,
                    pid = ?self.pid,
                    "deadline elapsed, process killed"
                );
                Ok(ProcessExit::TimedOut)
            }
        }
    }
}

fn stdin_error(program: &str, e: std::io::Error) -> TargetError {
    if e.kind() == std::io::ErrorKind::BrokenPipe {
        TargetError::StdinClosed
    } else {
        TargetError::io(format!("failed to write stdin of `{}`", program), e)
    }
}

/// Map an OS exit status to the signed return-code convention.
#[cfg(unix)]
pub(crate) fn return_code(status: std::process::ExitStatus) -> ReturnCode {
    use std::os::unix::process::ExitStatusExt;
    match status.code() {
        Some(code) => ReturnCode::exited(code),
        None => ReturnCode::signaled(status.signal().unwrap_or(0)),
    }
}

#[cfg(not(unix))]
pub(crate) fn return_code(status: std::process::ExitStatus) -> ReturnCode {
    ReturnCode::exited(status.code().unwrap_or(-1))
}

/// Execution target backed by the local host.
///
/// Declared environment entries are added on top of the tracer's own
/// environment for every process it starts.
#[derive(Debug, Clone)]
pub struct LocalTarget {
    metadata: TargetMetadata,
    cwd: Option<PathBuf>,
}

impl LocalTarget {
    pub fn new(metadata: TargetMetadata) -> Self {
        Self { metadata, cwd: None }
    }

    /// Working directory for started processes.
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }
}

#[async_trait]
impl ExecutionTarget for LocalTarget {
    fn metadata(&self) -> &TargetMetadata {
        &self.metadata
    }

    async fn run(
        &self,
        args: &[String],
        opts: RunOptions,
    ) -> Result<Box<dyn TargetProcess>, TargetError> {
        let (program, rest) = args.split_first().ok_or(TargetError::EmptyCommand)?;
        let mut command = Command::new(program);
        command.args(rest);
        for (key, value) in self.metadata.env.iter().filter_map(|e| e.split_once('=')) {
            command.env(key, value);
        }
        if let Some(ref cwd) = self.cwd {
            command.current_dir(cwd);
        }
        Ok(Box::new(LocalProcess::spawn(program, command, opts)?))
    }

    async fn resolve_glob(&self, pattern: &str) -> Result<Vec<String>, TargetError> {
        let paths = glob::glob(pattern).map_err(|e| TargetError::Glob {
            pattern: pattern.to_string(),
            message: e.msg.to_string(),
        })?;
        // Unreadable entries are skipped, as a shell would
        let mut matches: Vec<String> = paths
            .filter_map(|result| result.ok())
            .map(|path| path.to_string_lossy().into_owned())
            .collect();
        matches.sort();
        Ok(matches)
    }

    async fn retrieve_contents(&self, path: &str) -> Result<Vec<u8>, TargetError> {
        tokio::fs::read(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => TargetError::NotFound(path.to_string()),
            _ => TargetError::io(format!("failed to read {}", path), e),
        })
    }

    async fn retrieve_into(&self, remote_path: &str, local_dir: &Path) -> Result<(), TargetError> {
        let name = Path::new(remote_path)
            .file_name()
            .ok_or_else(|| TargetError::NotFound(remote_path.to_string()))?;
        tokio::fs::copy(remote_path, local_dir.join(name)).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => TargetError::NotFound(remote_path.to_string()),
            _ => TargetError::io(
                format!("failed to copy {} into {}", remote_path, local_dir.display()),
                e,
            ),
        })?;
        Ok(())
    }

    async fn make_dir(&self, path: &str) -> Result<(), TargetError> {
        tokio::fs::create_dir_all(path)
            .await
            .map_err(|e| TargetError::io(format!("failed to create {}", path), e))
    }

    async fn remove_dir(&self, path: &str) -> Result<(), TargetError> {
        match tokio::fs::remove_dir_all(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(TargetError::io(format!("failed to remove {}", path), e)),
        }
    }
}

#[cfg(test)]
#[path = "local_tests.rs"]
mod tests;
