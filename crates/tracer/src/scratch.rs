// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session-owned scratch directory inside the execution target.

use std::sync::Arc;

use emutrace_adapters::{ExecutionTarget, TargetError};
use emutrace_core::SessionId;

/// A scratch directory that is removed when the session ends.
///
/// [`ScratchDir::release`] is the normal teardown. A guard dropped without
/// it schedules the removal on the current tokio runtime, or logs the leak
/// when there is none.
pub struct ScratchDir {
    target: Arc<dyn ExecutionTarget>,
    path: String,
    released: bool,
}

impl ScratchDir {
    /// Path of the scratch directory for session `id` under `root`.
    pub fn path_for(root: &str, id: &SessionId) -> String {
        format!("{}/tracer_{}", root.trim_end_matches('/'), id)
    }

    /// Create `<root>/tracer_<id>` in the target.
    pub async fn create(
        target: Arc<dyn ExecutionTarget>,
        root: &str,
        id: &SessionId,
    ) -> Result<Self, TargetError> {
        let path = Self::path_for(root, id);
        target.make_dir(&path).await?;
        tracing::debug!(path = %path, "created scratch dir");
        Ok(Self { target, path, released: false })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Remove the directory and its contents. Failures are logged, not
    /// returned, so they never mask the error that ended a session.
    pub async fn release(mut self) {
        self.released = true;
        match self.target.remove_dir(&self.path).await {
            Ok(()) => tracing::debug!(path = %self.path, "released scratch dir"),
            Err(e) => {
                tracing::warn!(path = %self.path, error = %e, "failed to release scratch dir")
            }
        }
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let target = Arc::clone(&self.target);
        let path = std::mem::take(&mut self.path);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = target.remove_dir(&path).await {
                        tracing::warn!(path = %path, error = %e, "failed to release scratch dir");
                    }
                });
            }
            Err(_) => tracing::warn!(path = %path, "scratch dir leaked, no runtime to release it"),
        }
    }
}

#[cfg(test)]
#[path = "scratch_tests.rs"]
mod tests;
