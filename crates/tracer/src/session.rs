// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced execution sessions.
//!
//! [`Tracer::start`] allocates a scratch directory, launches the emulator and
//! hands back a live [`TraceSession`]. The caller feeds the process through
//! the session, then calls [`TraceSession::finish`], which waits within the
//! execution budget, collects artifacts and always releases the scratch
//! directory before returning.

use std::sync::Arc;
use std::time::Instant;

use emutrace_adapters::{ExecutionTarget, ProcessExit, RunOptions, TargetError, TargetProcess};
use emutrace_core::{Outcome, SessionId, TraceResults, TracingOptions};
use tracing::Instrument;

use crate::classify::classify;
use crate::command::{build_command, qemu_variant, ArtifactPaths};
use crate::config::TracerConfig;
use crate::error::TracerError;
use crate::parse::{fault_address, parse_trace, TraceFormat};
use crate::retrieve::Retriever;
use crate::scratch::ScratchDir;

/// Runs targets under the emulator.
///
/// Cheap to clone; clones share the execution target. Sessions started from
/// the same tracer are independent of each other.
#[derive(Clone)]
pub struct Tracer {
    target: Arc<dyn ExecutionTarget>,
    config: TracerConfig,
}

impl Tracer {
    pub fn new(target: Arc<dyn ExecutionTarget>, config: TracerConfig) -> Self {
        Self { target, config }
    }

    pub fn config(&self) -> &TracerConfig {
        &self.config
    }

    pub fn target(&self) -> &Arc<dyn ExecutionTarget> {
        &self.target
    }

    /// Start a traced execution.
    ///
    /// Unsupported target OS or architecture fails here, before the scratch
    /// directory exists or anything runs.
    pub async fn start(&self, options: TracingOptions) -> Result<TraceSession, TracerError> {
        let meta = self.target.metadata();
        let format = TraceFormat::for_os(meta.target_os()?);
        let variant = qemu_variant(meta, options.record_trace)?;

        let id = SessionId::new();
        let span = tracing::info_span!("tracer.session", session = %id);

        async {
            let scratch_path = ScratchDir::path_for(&self.config.scratch_root, &id);
            let paths = ArtifactPaths::new(&scratch_path, &options);
            let cmd = build_command(&self.config.launcher, &options, meta, &paths)?;

            let scratch =
                ScratchDir::create(Arc::clone(&self.target), &self.config.scratch_root, &id).await?;

            let process = match self.target.run(&cmd, RunOptions::piped(options.timeout)).await {
                Ok(process) => process,
                Err(e) => {
                    tracing::error!(error = %e, "failed to start emulator");
                    scratch.release().await;
                    return Err(e.into());
                }
            };

            tracing::info!(
                variant = %variant,
                pid = ?process.id(),
                timeout_ms = options.timeout.as_millis() as u64,
                "session started"
            );

            Ok(TraceSession {
                id: id.clone(),
                target: Arc::clone(&self.target),
                config: self.config.clone(),
                options,
                paths,
                format,
                scratch,
                process,
                started: Instant::now(),
                span: tracing::Span::current(),
            })
        }
        .instrument(span)
        .await
    }

    /// Run one execution feeding `testcases` to stdin, pausing between
    /// chunks, then close stdin and collect the results.
    ///
    /// A target that closes its stdin early simply receives fewer chunks, as
    /// does one still not reading when the budget elapses; that run then
    /// finishes as [`Outcome::TimedOut`].
    pub async fn fire<I>(
        &self,
        options: TracingOptions,
        testcases: I,
    ) -> Result<TraceResults, TracerError>
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        let mut session = self.start(options).await?;
        let delay = self.config.stdin_chunk_delay();

        for testcase in testcases {
            match session.write_stdin(testcase.as_ref()).await {
                Ok(()) => {}
                Err(TracerError::Target(TargetError::StdinClosed)) => {
                    tracing::debug!(
                        session = %session.id,
                        "stdin closed by target, not sending remaining testcases"
                    );
                    break;
                }
                Err(e) => {
                    session.abort().await;
                    return Err(e);
                }
            }
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        session.close_stdin();
        session.finish().await
    }
}

/// A live traced execution.
///
/// Dropping a session without [`finish`](Self::finish) kills the process and
/// schedules the scratch directory for removal.
pub struct TraceSession {
    id: SessionId,
    target: Arc<dyn ExecutionTarget>,
    config: TracerConfig,
    options: TracingOptions,
    paths: ArtifactPaths,
    format: TraceFormat,
    scratch: ScratchDir,
    process: Box<dyn TargetProcess>,
    started: Instant,
    span: tracing::Span,
}

impl TraceSession {
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Process id of the emulator, when the target exposes one.
    pub fn process_id(&self) -> Option<u32> {
        self.process.id()
    }

    pub fn scratch_dir(&self) -> &str {
        self.scratch.path()
    }

    pub fn options(&self) -> &TracingOptions {
        &self.options
    }

    pub async fn write_stdin(&mut self, data: &[u8]) -> Result<(), TracerError> {
        Ok(self.process.write_stdin(data).await?)
    }

    pub fn close_stdin(&mut self) {
        self.process.close_stdin();
    }

    /// Kill the process and release the scratch directory without
    /// collecting anything.
    pub async fn abort(self) {
        let TraceSession { process, scratch, span, .. } = self;
        drop(process);
        scratch.release().instrument(span).await;
    }

    /// Wait for the process, collect its artifacts and close the session.
    ///
    /// A process that outlives its budget yields [`Outcome::TimedOut`]. The
    /// scratch directory is released whether or not collection succeeds.
    pub async fn finish(self) -> Result<TraceResults, TracerError> {
        let TraceSession {
            id,
            target,
            config,
            options,
            paths,
            format,
            scratch,
            process,
            started,
            span,
        } = self;

        async move {
            let collector = Collector {
                id: &id,
                target: target.as_ref(),
                config: &config,
                options: &options,
                paths: &paths,
                format,
            };
            let result = collector.collect(process).await;
            scratch.release().await;

            let elapsed_ms = started.elapsed().as_millis() as u64;
            match &result {
                Ok(results) => tracing::info!(
                    elapsed_ms,
                    outcome = ?results.outcome,
                    blocks = results.trace.as_ref().map(Vec::len),
                    "session finished"
                ),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "session failed"),
            }
            result
        }
        .instrument(span)
        .await
    }
}

/// Borrowed view of a session used to build its result record.
struct Collector<'a> {
    id: &'a SessionId,
    target: &'a dyn ExecutionTarget,
    config: &'a TracerConfig,
    options: &'a TracingOptions,
    paths: &'a ArtifactPaths,
    format: TraceFormat,
}

impl Collector<'_> {
    async fn collect(
        &self,
        mut process: Box<dyn TargetProcess>,
    ) -> Result<TraceResults, TracerError> {
        let exit = process.wait().await;
        drop(process);

        let mut results = match exit? {
            ProcessExit::TimedOut => {
                tracing::info!(
                    timeout_ms = self.options.timeout.as_millis() as u64,
                    "process timed out"
                );
                TraceResults::new(self.id.clone(), Outcome::TimedOut)
            }
            ProcessExit::Exited { returncode, stdout, stderr } => {
                let fault = classify(returncode);
                if let Some(kind) = fault {
                    tracing::info!(%returncode, fault = %kind, "process crashed");
                }
                let mut results =
                    TraceResults::new(self.id.clone(), Outcome::Exited { returncode, fault });
                results.stdout = stdout;
                results.stderr = stderr;
                results
            }
        };

        let retriever = Retriever::new(self.target, self.config.retrieve_timeout());

        // A timed-out process may still have dumped core
        if self.options.save_core {
            let dest = self.config.local_tmp.join(format!("tracer-{}.core", self.id));
            results.core_path = Some(retriever.core(&self.paths.core_pattern(), &dest).await?);
        }

        if results.timed_out() {
            return Ok(results);
        }

        if let Some(ref trace_path) = self.paths.trace {
            let content = retriever.trace(trace_path).await?;
            let parsed = parse_trace(&content, self.format)?;
            let crashed = results.crashed().unwrap_or(false);
            results.fault_address = fault_address(&parsed.blocks, crashed)?;
            results.base_address = Some(parsed.base_address);
            results.trace = Some(parsed.blocks);
        }

        if let Some(ref snapshot_path) = self.paths.snapshot {
            results.snapshot = Some(retriever.snapshot(snapshot_path).await?);
        }

        Ok(results)
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
