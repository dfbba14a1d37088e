// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for the session specs.

use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use std::time::Duration;

pub use emutrace_adapters::LocalTarget;
pub use emutrace_core::{FaultKind, Outcome, ReturnCode, TargetMetadata, TracingOptions, PAGE_SIZE};
pub use emutrace_tracer::{Tracer, TracerConfig, TracerError};
pub use serial_test::serial;
use tempfile::TempDir;

/// Stand-in for the emulator launcher.
///
/// Understands the artifact flags the tracer passes and ignores the rest.
/// Behaviour is driven by `STANDIN_*` variables in the target's declared
/// environment:
///
/// - `STANDIN_BLOCKS`: number of trace entries, the last one at 0x401000
/// - `STANDIN_SLEEP`: seconds to sleep before doing anything
/// - `STANDIN_CORE`: when set, write a core file into the `-C` directory
/// - `STANDIN_SIGNAL`: kill itself with this signal
/// - `STANDIN_EXIT`: exit code
const LAUNCHER: &str = r#"#!/bin/sh
trace=""
magic=""
cores=""
while [ $# -gt 0 ]; do
    case "$1" in
        -C) cores="$2"; shift 2 ;;
        -D) trace="$2"; shift 2 ;;
        -magicdump) magic="$2"; shift 2 ;;
        -d|-seed|-m|-E) shift 2 ;;
        *) shift ;;
    esac
done

if [ -n "$STANDIN_SLEEP" ]; then
    sleep "$STANDIN_SLEEP"
fi

cat

if [ -n "$trace" ]; then
    echo "start_code  0x0000000000400000" > "$trace"
    n="${STANDIN_BLOCKS:-10}"
    i=0
    while [ "$i" -lt "$n" ]; do
        printf 'Trace 0: 0x7f0000000000 [00000000/%016x/0x00000000] \n' $((0x401000 - (n - 1 - i) * 64)) >> "$trace"
        i=$((i + 1))
    done
fi

if [ -n "$magic" ]; then
    head -c 4096 /dev/zero > "$magic"
fi

if [ -n "$STANDIN_CORE" ] && [ -n "$cores" ]; then
    printf 'CORE' > "$cores/qemu_standin_$$.core"
fi

if [ -n "$STANDIN_SIGNAL" ]; then
    kill -s "$STANDIN_SIGNAL" $$
fi
exit "${STANDIN_EXIT:-0}"
"#;

/// A temporary directory holding the stand-in launcher, the scratch root
/// and the local core directory.
pub struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let launcher = dir.path().join("fire");
        std::fs::write(&launcher, LAUNCHER).unwrap();
        set_executable(&launcher);
        std::fs::create_dir(dir.path().join("scratch")).unwrap();
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn scratch_root(&self) -> PathBuf {
        self.path().join("scratch")
    }

    pub fn cores(&self) -> PathBuf {
        self.path().join("cores")
    }

    /// A tracer for a linux x86_64 target whose declared environment is `env`.
    pub fn tracer(&self, env: &[&str]) -> Tracer {
        let meta = TargetMetadata::new("linux", "x86_64")
            .args(vec!["/bin/target".to_string()])
            .env(env.iter().map(|e| e.to_string()).collect::<Vec<_>>());
        let target = LocalTarget::new(meta).with_cwd(self.path());
        let config = TracerConfig::default()
            .launcher(self.path().join("fire").display().to_string())
            .scratch_root(self.scratch_root().display().to_string())
            .local_tmp(self.cores())
            .stdin_chunk_delay_ms(1);
        Tracer::new(Arc::new(target), config)
    }

    /// Scratch directories still present.
    pub fn leftover_scratch(&self) -> Vec<PathBuf> {
        std::fs::read_dir(self.scratch_root())
            .unwrap()
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .collect()
    }
}

#[cfg(unix)]
fn set_executable(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) {}
