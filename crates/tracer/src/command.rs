// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Emulator command line construction.
//!
//! Pure functions: nothing here touches the execution target, so an
//! unsupported OS or architecture is rejected before any process starts.

use emutrace_core::{ConfigError, TargetMetadata, TracingOptions};

/// Environment entry that forces eager symbol binding in the target.
const LD_BIND_NOW: &str = "LD_BIND_NOW=1";

/// Paths inside the execution environment the emulator writes artifacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    /// Directory the emulator drops `qemu_*.core` files into
    pub coredump_dir: String,
    /// Trace log, when trace recording is on
    pub trace: Option<String>,
    /// Scratch page dump, when snapshot recording is on
    pub snapshot: Option<String>,
}

impl ArtifactPaths {
    /// Lay out every artifact inside `scratch_dir`.
    pub fn new(scratch_dir: &str, options: &TracingOptions) -> Self {
        Self {
            coredump_dir: scratch_dir.to_string(),
            trace: options.record_trace.then(|| format!("{}/trace.log", scratch_dir)),
            snapshot: options.record_snapshot.then(|| format!("{}/snapshot.magic", scratch_dir)),
        }
    }

    /// Glob matching the core files the emulator writes.
    pub fn core_pattern(&self) -> String {
        format!("{}/qemu_*.core", self.coredump_dir)
    }
}

/// Name of the emulator build for this target.
pub fn qemu_variant(meta: &TargetMetadata, record_trace: bool) -> Result<String, ConfigError> {
    if meta.target_os()?.is_cgc() {
        let flavor = if record_trace { "tracer" } else { "base" };
        return Ok(format!("shellphish-qemu-cgc-{}", flavor));
    }
    Ok(format!("shellphish-qemu-linux-{}", meta.target_arch()?))
}

/// Full argument vector for one traced execution.
pub fn build_command(
    launcher: &str,
    options: &TracingOptions,
    meta: &TargetMetadata,
    paths: &ArtifactPaths,
) -> Result<Vec<String>, ConfigError> {
    let cgc = meta.target_os()?.is_cgc();
    let variant = qemu_variant(meta, options.record_trace)?;

    let mut cmd = vec![launcher.to_string(), variant, "-C".into(), paths.coredump_dir.clone()];

    match paths.trace {
        Some(ref trace) if options.record_trace => {
            let events = if cgc { "exec" } else { "nochain,exec,page" };
            cmd.extend(["-d", events, "-D", trace.as_str()].map(String::from));
        }
        _ => cmd.push("-enable_double_empty_exiting".into()),
    }

    if let Some(ref snapshot) = paths.snapshot {
        if options.record_snapshot {
            cmd.extend(["-magicdump", snapshot.as_str()].map(String::from));
        }
    }

    if let Some(seed) = options.seed {
        cmd.extend(["-seed".to_string(), seed.to_string()]);
    }

    if options.report_bad_args {
        cmd.push("-report_bad_args".into());
    }

    if cgc {
        cmd.extend(["-m", "8G"].map(String::from));
    }

    if !cgc && !meta.has_env(LD_BIND_NOW) {
        tracing::warn!(
            entry = LD_BIND_NOW,
            "setting LD_BIND_NOW for the traced program, its observed environment will differ"
        );
        cmd.extend(["-E", LD_BIND_NOW].map(String::from));
    }

    if let Some(ref lib_path) = options.library_path {
        tracing::warn!(
            library_path = %lib_path,
            "setting LD_LIBRARY_PATH for the traced program, its observed environment will differ"
        );
        cmd.extend(["-E".to_string(), format!("LD_LIBRARY_PATH={}", lib_path)]);
    }

    cmd.extend(meta.args.iter().cloned());
    Ok(cmd)
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
