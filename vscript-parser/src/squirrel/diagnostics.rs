//! Lexical diagnostics.
//!
//! Diagnostics carry byte offsets into the tokenized text. For embedded
//! tokenizations the offsets are already mapped back to the outer file, so a
//! consumer never needs to know which nesting level produced a diagnostic.

use serde::Serialize;

/// Diagnostic severity, numbered the way the editor protocol expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Error = 1,
    Warning = 2,
}

/// A diagnostic over a byte range of the source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub start: usize,
    pub end: usize,
    pub message: String,
    pub severity: Severity,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            message: message.into(),
            severity: Severity::Error,
        }
    }

    pub fn warning(message: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            message: message.into(),
            severity: Severity::Warning,
        }
    }
}
