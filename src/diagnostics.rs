use std::ops::Range;

use serde::Serialize;

use crate::level::LintLevel;
use crate::lint::LintDescriptor;

/// A single finding, with the rewrite that fixes it.
#[derive(Debug, Clone)]
#[must_use]
pub struct Diagnostic {
    pub lint: &'static LintDescriptor,
    pub level: LintLevel,
    pub file: Option<String>,
    pub span: Span,
    /// Byte range the suggestion replaces.
    pub range: Range<usize>,
    pub message: String,
    pub help: Option<String>,
    pub suggestion: Option<Suggestion>,
}

/// Optional machine- or human-applicable fix for a diagnostic.
#[derive(Debug, Clone)]
pub struct Suggestion {
    pub message: String,
    pub replacement: String,
    pub applicability: Applicability,
}

/// Applicability of an automated suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Applicability {
    MachineApplicable,
    MaybeIncorrect,
}

impl Applicability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Applicability::MachineApplicable => "machine-applicable",
            Applicability::MaybeIncorrect => "maybe-incorrect",
        }
    }
}

/// Span in a source file (1-based row/column positions).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

/// Single position in a source file (1-based row, 1-based byte column).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub row: usize,
    pub column: usize,
}

impl Position {
    /// Position of `byte_offset` in `source`, clamped to the end of the text.
    pub fn from_byte_offset(source: &str, byte_offset: usize) -> Self {
        let mut row = 1usize;
        let mut column = 1usize;

        let end = byte_offset.min(source.len());
        for b in source.as_bytes().iter().take(end) {
            if *b == b'\n' {
                row += 1;
                column = 1;
            } else {
                column += 1;
            }
        }

        Self { row, column }
    }
}

impl Span {
    /// Construct a `Span` for a byte range of `source`.
    #[must_use]
    pub fn from_byte_range(source: &str, range: &Range<usize>) -> Self {
        Self {
            start: Position::from_byte_offset(source, range.start),
            end: Position::from_byte_offset(source, range.end),
        }
    }
}
