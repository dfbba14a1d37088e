// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tracer configuration.
//!
//! Settings that stay the same across sessions: where the emulator launcher
//! lives, where scratch state goes, how long artifact retrieval may take.
//! Loaded from TOML, then overridden by `EMUTRACE_*` environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::env;
use crate::error::TracerError;

/// Launcher the emulator builds are installed under.
pub const DEFAULT_LAUNCHER: &str = "/tmp/shellphish_qemu/fire";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TracerConfig {
    /// Emulator launcher path inside the execution environment
    pub launcher: String,
    /// Parent of per-session scratch directories inside the execution environment
    pub scratch_root: String,
    /// Local directory retrieved core files are moved to
    pub local_tmp: PathBuf,
    /// Bound on each artifact retrieval, separate from the execution budget
    pub retrieve_timeout_ms: u64,
    /// Pause between testcase chunks written by [`crate::Tracer::fire`]
    pub stdin_chunk_delay_ms: u64,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            launcher: DEFAULT_LAUNCHER.to_string(),
            scratch_root: "/tmp".to_string(),
            local_tmp: std::env::temp_dir(),
            retrieve_timeout_ms: 30_000,
            stdin_chunk_delay_ms: 10,
        }
    }
}

impl TracerConfig {
    emutrace_core::setters! {
        into {
            launcher: String,
            scratch_root: String,
            local_tmp: PathBuf,
        }
        set {
            retrieve_timeout_ms: u64,
            stdin_chunk_delay_ms: u64,
        }
    }

    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Parse a TOML document; missing keys keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }

    /// Load a TOML file and apply environment overrides.
    pub fn load(path: &Path) -> Result<Self, TracerError> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| TracerError::io(format!("failed to read {}", path.display()), e))?;
        let config = Self::from_toml_str(&source).map_err(|e| TracerError::InvalidConfig {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(config.with_env_overrides())
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Some(launcher) = env::launcher() {
            self.launcher = launcher;
        }
        if let Some(root) = env::scratch_root() {
            self.scratch_root = root;
        }
        if let Some(dir) = env::local_tmp() {
            self.local_tmp = dir;
        }
        if let Some(timeout) = env::retrieve_timeout() {
            self.retrieve_timeout_ms = timeout.as_millis() as u64;
        }
        self
    }

    pub fn retrieve_timeout(&self) -> Duration {
        Duration::from_millis(self.retrieve_timeout_ms)
    }

    pub fn stdin_chunk_delay(&self) -> Duration {
        Duration::from_millis(self.stdin_chunk_delay_ms)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
