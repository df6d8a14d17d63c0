// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Error types and diagnostic context rendering for the assembler.

use std::fmt;

/// Categories of assembler errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsmErrorKind {
    Assembler,
    Cli,
    Directive,
    Instruction,
    Io,
    Operand,
    Preprocess,
    Symbol,
}

/// An assembler error with a kind and message.
#[derive(Debug, Clone)]
pub struct AsmError {
    kind: AsmErrorKind,
    message: String,
}

impl AsmError {
    pub fn new(kind: AsmErrorKind, msg: &str, param: Option<&str>) -> Self {
        Self {
            kind,
            message: format_error(msg, param),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> AsmErrorKind {
        self.kind
    }
}

impl fmt::Display for AsmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AsmError {}

/// Format an error message with an optional parameter.
pub fn format_error(msg: &str, param: Option<&str>) -> String {
    match param {
        Some(p) => format!("{msg}: {p}"),
        None => msg.to_string(),
    }
}

/// Build context lines for error display: the numbered source line,
/// followed by a marker row pointing at the error column when one is
/// known.
pub fn build_context_lines(
    line_num: u32,
    column: Option<usize>,
    source_override: Option<&str>,
    use_color: bool,
) -> Vec<String> {
    let mut out = Vec::new();
    let source = match source_override {
        Some(source) => source,
        None => {
            out.push(format!("{line_num:>5} | <source unavailable>"));
            return out;
        }
    };
    out.push(format!("{line_num:>5} | {source}"));
    if let Some(marker) = marker_row(source, column, use_color) {
        out.push(format!("{:>5} | {marker}", ""));
    }
    out
}

/// Marker row for a 1-based column. Tabs in the source keep their width
/// so the caret stays aligned.
fn marker_row(source: &str, column: Option<usize>, use_color: bool) -> Option<String> {
    let col = column.filter(|&c| c > 0)?;
    let mut row = String::new();
    for c in source.chars().take(col - 1) {
        row.push(if c == '\t' { '\t' } else { ' ' });
    }
    if use_color {
        row.push_str("\x1b[1;31m^\x1b[0m");
    } else {
        row.push('^');
    }
    Some(row)
}
