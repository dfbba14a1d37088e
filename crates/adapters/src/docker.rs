// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Docker execution target: a running container driven through the
//! `docker` CLI.
//!
//! Processes are started with `docker exec -i`, so the budget enforced by
//! [`LocalProcess`] applies to the exec client. Files are read with
//! `docker exec cat` and copied out with `docker cp`. The container itself
//! is provisioned and torn down by the caller.

use std::path::Path;

use async_trait::async_trait;
use emutrace_core::TargetMetadata;
use tokio::process::Command;

use crate::local::LocalProcess;
use crate::target::{ExecutionTarget, RunOptions, TargetError, TargetProcess};

/// Execution target backed by a running Docker container.
#[derive(Debug, Clone)]
pub struct DockerTarget {
    container: String,
    metadata: TargetMetadata,
    aslr: bool,
    docker: String,
}

impl DockerTarget {
    pub fn new(container: impl Into<String>, metadata: TargetMetadata) -> Self {
        Self { container: container.into(), metadata, aslr: true, docker: "docker".to_string() }
    }

    /// Run target processes with address-space randomization disabled
    /// (`setarch <arch> -R`).
    pub fn without_aslr(mut self) -> Self {
        self.aslr = false;
        self
    }

    /// Use a different docker-compatible CLI (e.g. `podman`).
    pub fn with_cli(mut self, docker: impl Into<String>) -> Self {
        self.docker = docker.into();
        self
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    /// Arguments for `docker` that run `command` inside the container with
    /// the declared environment.
    pub fn exec_args(&self, command: &[String]) -> Vec<String> {
        let mut args = vec!["exec".to_string(), "-i".to_string()];
        for entry in &self.metadata.env {
            args.push("-e".to_string());
            args.push(entry.clone());
        }
        args.push(self.container.clone());
        if !self.aslr {
            args.extend(["setarch".to_string(), self.metadata.arch.clone(), "-R".to_string()]);
        }
        args.extend(command.iter().cloned());
        args
    }

    /// Arguments for a non-interactive helper command inside the container.
    fn helper_args(&self, command: &[&str]) -> Vec<String> {
        let mut args = vec!["exec".to_string(), self.container.clone()];
        args.extend(command.iter().map(|s| s.to_string()));
        args
    }

    /// Run a docker CLI command and return stdout on success.
    async fn run_docker(&self, args: &[String]) -> Result<Vec<u8>, TargetError> {
        let output = Command::new(&self.docker)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| TargetError::Spawn { program: self.docker.clone(), source })?;

        if output.status.success() {
            Ok(output.stdout)
        } else {
            Err(TargetError::Command {
                command: format!("{} {}", self.docker, args.join(" ")),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

/// `sh` invocation listing the paths `pattern` expands to, one per line.
///
/// Only the final path component is expanded. The directory travels as a
/// positional parameter, so spaces or metacharacters in it stay literal. An
/// unmatched pattern stays literal in POSIX sh, hence the existence test.
pub fn glob_command(pattern: &str) -> Vec<String> {
    let (dir, name) = pattern.rsplit_once('/').unwrap_or((".", pattern));
    let script = format!(
        "for f in \"$1\"/{}; do [ -e \"$f\" ] && printf '%s\\n' \"$f\"; done; true",
        name
    );
    vec!["sh".to_string(), "-c".to_string(), script, "sh".to_string(), dir.to_string()]
}

#[async_trait]
impl ExecutionTarget for DockerTarget {
    fn metadata(&self) -> &TargetMetadata {
        &self.metadata
    }

    async fn run(
        &self,
        args: &[String],
        opts: RunOptions,
    ) -> Result<Box<dyn TargetProcess>, TargetError> {
        if args.is_empty() {
            return Err(TargetError::EmptyCommand);
        }
        let docker_args = self.exec_args(args);
        tracing::info!(container = %self.container, program = %args[0], "docker exec");
        let mut command = Command::new(&self.docker);
        command.args(&docker_args);
        Ok(Box::new(LocalProcess::spawn(&self.docker, command, opts)?))
    }

    async fn resolve_glob(&self, pattern: &str) -> Result<Vec<String>, TargetError> {
        let mut args = vec!["exec".to_string(), self.container.clone()];
        args.extend(glob_command(pattern));
        let stdout = self.run_docker(&args).await?;
        let mut matches: Vec<String> = String::from_utf8_lossy(&stdout)
            .lines()
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        matches.sort();
        Ok(matches)
    }

    async fn retrieve_contents(&self, path: &str) -> Result<Vec<u8>, TargetError> {
        self.run_docker(&self.helper_args(&["cat", path])).await.map_err(|e| match e {
            TargetError::Command { ref stderr, .. } if stderr.contains("No such file") => {
                TargetError::NotFound(path.to_string())
            }
            other => other,
        })
    }

    async fn retrieve_into(&self, remote_path: &str, local_dir: &Path) -> Result<(), TargetError> {
        let source = format!("{}:{}", self.container, remote_path);
        let dest = format!("{}/", local_dir.display());
        self.run_docker(&["cp".to_string(), source, dest]).await?;
        Ok(())
    }

    async fn make_dir(&self, path: &str) -> Result<(), TargetError> {
        self.run_docker(&self.helper_args(&["mkdir", "-p", path])).await?;
        Ok(())
    }

    async fn remove_dir(&self, path: &str) -> Result<(), TargetError> {
        self.run_docker(&self.helper_args(&["rm", "-rf", path])).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "docker_tests.rs"]
mod tests;
