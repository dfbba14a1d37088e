// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Trace log parsing.
//!
//! The emulator writes a `start_code <hex>` line once the target is loaded,
//! then one `Trace ...` line per executed basic block. Two entry layouts
//! exist depending on the emulator build:
//!
//! ```text
//! Trace 0x7f5d4c000100 [08048000]                            (cgc)
//! Trace 0: 0x7f5d4c000100 [00000000/0000000000401000/0x0]    (linux)
//! ```

use std::sync::LazyLock;

use emutrace_core::TargetOs;
use regex::bytes::Regex;

use crate::error::{ParseError, TracerError};

const BASE_MARKER: &[u8] = b"start_code";
const ENTRY_MARKER: &[u8] = b"Trace ";

#[allow(clippy::expect_used)]
static PLAIN_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Trace .* \[(?P<addr>(?:0[xX])?[0-9a-fA-F]+)\]")
        .expect("constant regex pattern is valid")
});

#[allow(clippy::expect_used)]
static CHAINED_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^Trace .* \[(?P<tb>(?:0[xX])?[0-9a-fA-F]+)/(?P<addr>(?:0[xX])?[0-9a-fA-F]+)/(?P<flags>[^\]]*)\]",
    )
    .expect("constant regex pattern is valid")
});

/// Layout of `Trace` entries, fixed for the lifetime of a session.
///
/// New emulator log layouts get a new variant rather than a looser pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceFormat {
    /// `[<addr>]`, written by the cgc builds
    Plain,
    /// `[<tb>/<addr>/<flags>]`, written by the linux builds
    Chained,
}

impl TraceFormat {
    pub fn for_os(os: TargetOs) -> Self {
        match os {
            TargetOs::Cgc => TraceFormat::Plain,
            TargetOs::Linux => TraceFormat::Chained,
        }
    }

    fn pattern(&self) -> &'static Regex {
        match self {
            TraceFormat::Plain => &PLAIN_ENTRY,
            TraceFormat::Chained => &CHAINED_ENTRY,
        }
    }
}

/// A parsed trace log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTrace {
    pub base_address: u64,
    /// Executed block addresses in log order
    pub blocks: Vec<u64>,
}

fn parse_hex(field: &[u8]) -> Option<u64> {
    let text = std::str::from_utf8(field).ok()?;
    let digits = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")).unwrap_or(text);
    u64::from_str_radix(digits, 16).ok()
}

fn lossy(line: &[u8]) -> String {
    String::from_utf8_lossy(line).into_owned()
}

/// Parse raw trace log content.
pub fn parse_trace(content: &[u8], format: TraceFormat) -> Result<ParsedTrace, ParseError> {
    let mut lines = content
        .split(|b| *b == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
        .enumerate();

    let base_address = loop {
        let Some((_, line)) = lines.next() else {
            return Err(ParseError::MissingBase);
        };
        if !line.starts_with(BASE_MARKER) {
            continue;
        }
        break line
            .split(|b| b.is_ascii_whitespace())
            .filter(|field| !field.is_empty())
            .nth(1)
            .and_then(parse_hex)
            .ok_or_else(|| ParseError::InvalidBase { line: lossy(line) })?;
    };

    let pattern = format.pattern();
    let mut blocks = Vec::new();
    for (idx, line) in lines {
        if !line.starts_with(ENTRY_MARKER) {
            continue;
        }
        let addr = pattern
            .captures(line)
            .and_then(|caps| caps.name("addr"))
            .and_then(|m| parse_hex(m.as_bytes()))
            .ok_or_else(|| ParseError::InvalidTraceLine { line_no: idx + 1, line: lossy(line) })?;
        blocks.push(addr);
    }

    tracing::debug!(
        blocks = blocks.len(),
        base_address = format_args!("{:#x}", base_address),
        "parsed trace"
    );
    Ok(ParsedTrace { base_address, blocks })
}

/// Fault address of a run: the last executed block when it crashed.
pub fn fault_address(blocks: &[u64], crashed: bool) -> Result<Option<u64>, TracerError> {
    if !crashed {
        return Ok(None);
    }
    blocks.last().copied().map(Some).ok_or(TracerError::CrashWithoutTrace)
}

#[cfg(test)]
#[path = "parse_tests.rs"]
mod tests;
