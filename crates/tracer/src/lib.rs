// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! emutrace-tracer: run a target under a tracing emulator, collect what it
//! leaves behind and classify how it ended

pub mod classify;
pub mod command;
pub mod config;
mod env;
pub mod error;
pub mod parse;
pub mod retrieve;
pub mod scratch;
pub mod session;

pub use classify::{classify, SEGV_CODES, SIGILL_CODES};
pub use command::{build_command, qemu_variant, ArtifactPaths};
pub use config::{TracerConfig, DEFAULT_LAUNCHER};
pub use error::{ParseError, TracerError};
pub use parse::{fault_address, parse_trace, ParsedTrace, TraceFormat};
pub use retrieve::Retriever;
pub use scratch::ScratchDir;
pub use session::{TraceSession, Tracer};
