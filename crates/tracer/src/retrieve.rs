// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pulling emulator artifacts out of the execution target.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use emutrace_adapters::{ExecutionTarget, TargetError};
use emutrace_core::PAGE_SIZE;

use crate::error::TracerError;

/// Artifact retrieval bounded by a per-call timeout.
///
/// The bound is independent of the execution budget: it applies after the
/// process has concluded, and matters mostly for remote targets.
pub struct Retriever<'a> {
    target: &'a dyn ExecutionTarget,
    timeout: Duration,
}

impl<'a> Retriever<'a> {
    pub fn new(target: &'a dyn ExecutionTarget, timeout: Duration) -> Self {
        Self { target, timeout }
    }

    async fn bounded<T>(
        &self,
        path: &str,
        op: impl Future<Output = Result<T, TargetError>>,
    ) -> Result<T, TracerError> {
        match tokio::time::timeout(self.timeout, op).await {
            Ok(result) => Ok(result?),
            Err(_) => {
                Err(TracerError::RetrieveTimeout { path: path.to_string(), timeout: self.timeout })
            }
        }
    }

    /// Find the single core file matching `pattern` and move it to `dest`.
    ///
    /// The file is staged in a temporary directory next to `dest` so the
    /// final move is a rename and `dest` never holds a partial copy.
    pub async fn core(&self, pattern: &str, dest: &Path) -> Result<PathBuf, TracerError> {
        let matches = self.bounded(pattern, self.target.resolve_glob(pattern)).await?;
        let [remote] = matches.as_slice() else {
            return Err(TracerError::CoreDumpCount {
                pattern: pattern.to_string(),
                found: matches.len(),
            });
        };

        let parent = dest.parent().unwrap_or_else(|| Path::new("."));
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| TracerError::io(format!("failed to create {}", parent.display()), e))?;
        let staging = tempfile::Builder::new()
            .prefix(".emutrace-core-")
            .tempdir_in(parent)
            .map_err(|e| TracerError::io("failed to create staging dir", e))?;

        self.bounded(remote, self.target.retrieve_into(remote, staging.path())).await?;

        let name = Path::new(remote)
            .file_name()
            .ok_or_else(|| TracerError::Target(TargetError::NotFound(remote.clone())))?;
        let staged = staging.path().join(name);
        tokio::fs::rename(&staged, dest).await.map_err(|e| {
            TracerError::io(format!("failed to move core file to {}", dest.display()), e)
        })?;

        tracing::debug!(remote = %remote, local = %dest.display(), "retrieved core file");
        Ok(dest.to_path_buf())
    }

    /// Whole trace log, for parsing in memory.
    pub async fn trace(&self, path: &str) -> Result<Vec<u8>, TracerError> {
        let content = self.bounded(path, self.target.retrieve_contents(path)).await?;
        tracing::debug!(path, bytes = content.len(), "retrieved trace log");
        Ok(content)
    }

    /// Scratch page dump; anything but exactly one page is rejected.
    pub async fn snapshot(&self, path: &str) -> Result<Vec<u8>, TracerError> {
        let content = self.bounded(path, self.target.retrieve_contents(path)).await?;
        if content.len() != PAGE_SIZE {
            return Err(TracerError::SnapshotSize { expected: PAGE_SIZE, actual: content.len() });
        }
        tracing::debug!(path, "retrieved snapshot");
        Ok(content)
    }
}

#[cfg(test)]
#[path = "retrieve_tests.rs"]
mod tests;
