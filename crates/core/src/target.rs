// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-only description of the program under test.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while interpreting target metadata.
///
/// These are configuration errors: they surface before any process is
/// started.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unsupported target OS family: {0}")]
    UnknownOs(String),
    #[error("unsupported target architecture: {0}")]
    UnknownArch(String),
}

/// Operating-system family of the target.
///
/// `Cgc` is the DECREE family, which has its own emulator builds and trace
/// format. Everything else runs under a Linux user-mode emulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetOs {
    Linux,
    Cgc,
}

impl TargetOs {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetOs::Linux => "linux",
            TargetOs::Cgc => "cgc",
        }
    }

    pub fn is_cgc(&self) -> bool {
        matches!(self, TargetOs::Cgc)
    }
}

crate::simple_display! {
    TargetOs {
        Linux => "linux",
        Cgc => "cgc",
    }
}

impl FromStr for TargetOs {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linux" => Ok(TargetOs::Linux),
            "cgc" => Ok(TargetOs::Cgc),
            other => Err(ConfigError::UnknownOs(other.to_string())),
        }
    }
}

/// CPU architecture of the target, named the way emulator builds are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    X86_64,
    I386,
    Aarch64,
    Arm,
    Mips,
    Mipsel,
    Mips64,
    Ppc,
    Ppc64,
}

impl Arch {
    /// Suffix of the emulator build for this architecture.
    pub fn as_str(&self) -> &'static str {
        match self {
            Arch::X86_64 => "x86_64",
            Arch::I386 => "i386",
            Arch::Aarch64 => "aarch64",
            Arch::Arm => "arm",
            Arch::Mips => "mips",
            Arch::Mipsel => "mipsel",
            Arch::Mips64 => "mips64",
            Arch::Ppc => "ppc",
            Arch::Ppc64 => "ppc64",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Arch {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "x86_64" | "amd64" => Ok(Arch::X86_64),
            "i386" | "i686" | "x86" => Ok(Arch::I386),
            "aarch64" | "arm64" => Ok(Arch::Aarch64),
            "arm" | "armel" | "armhf" => Ok(Arch::Arm),
            "mips" => Ok(Arch::Mips),
            "mipsel" => Ok(Arch::Mipsel),
            "mips64" => Ok(Arch::Mips64),
            "ppc" | "powerpc" => Ok(Arch::Ppc),
            "ppc64" | "powerpc64" => Ok(Arch::Ppc64),
            other => Err(ConfigError::UnknownArch(other.to_string())),
        }
    }
}

/// Metadata an execution target declares about the program it runs.
///
/// Tags are kept as strings: an execution target reports whatever its
/// image or host says, and validation happens when a tracer needs the
/// typed view.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TargetMetadata {
    /// OS family tag (`linux`, `cgc`)
    pub os: String,
    /// Architecture tag (`x86_64`, `aarch64`, ...)
    pub arch: String,
    /// Declared program argv, passed to the emulator verbatim
    pub args: Vec<String>,
    /// Declared environment as `KEY=VALUE` entries
    pub env: Vec<String>,
}

impl TargetMetadata {
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self { os: os.into(), arch: arch.into(), args: Vec::new(), env: Vec::new() }
    }

    crate::setters! {
        into { args: Vec<String>, env: Vec<String> }
    }

    pub fn target_os(&self) -> Result<TargetOs, ConfigError> {
        self.os.parse()
    }

    pub fn target_arch(&self) -> Result<Arch, ConfigError> {
        self.arch.parse()
    }

    /// True when the declared environment contains exactly `entry`.
    pub fn has_env(&self, entry: &str) -> bool {
        self.env.iter().any(|e| e == entry)
    }
}

#[cfg(test)]
#[path = "target_tests.rs"]
mod tests;
