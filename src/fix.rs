//! Applying rewrite suggestions to source text.
//!
//! Everything here works on strings and byte offsets; the driver owns file I/O.
//!
//! Nested casts such as `a.cast<B>().cast<C>()` produce diagnostics whose
//! ranges nest. Only the outermost edit of an overlapping group is applied in
//! one pass; the inner ones are reported as deferred and picked up when the
//! caller re-lints the fixed text.

use std::path::Path;

use similar::TextDiff;
use thiserror::Error;

use crate::diagnostics::{Applicability, Diagnostic};

/// Error type for fix application operations.
#[derive(Debug, Error)]
pub enum FixError {
    #[error("Cannot apply fixes to stdin - please specify a file path")]
    StdinNotSupported,

    #[error("Overlapping edits detected at byte {0}")]
    OverlappingEdits(usize),

    #[error("Edit range [{start}..{end}) exceeds source length {source_len}")]
    InvalidRange {
        start: usize,
        end: usize,
        source_len: usize,
    },

    #[error("Edit start {start} is after edit end {end}")]
    InvalidEditOrder { start: usize, end: usize },

    #[error("Edit range [{start}..{end}) does not fall on character boundaries")]
    NotCharBoundary { start: usize, end: usize },
}

/// A replacement of the byte range `[start_byte..end_byte)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub start_byte: usize,
    pub end_byte: usize,
    pub replacement: String,
}

impl TextEdit {
    pub fn new(start_byte: usize, end_byte: usize, replacement: impl Into<String>) -> Self {
        Self {
            start_byte,
            end_byte,
            replacement: replacement.into(),
        }
    }

    pub fn range(&self) -> std::ops::Range<usize> {
        self.start_byte..self.end_byte
    }

    /// Half-open ranges `[a, b)` and `[c, d)` overlap iff `a < d && c < b`.
    pub fn overlaps_with(&self, other: &TextEdit) -> bool {
        self.start_byte < other.end_byte && other.start_byte < self.end_byte
    }

    pub fn validate(&self, source: &str) -> Result<(), FixError> {
        if self.start_byte > self.end_byte {
            return Err(FixError::InvalidEditOrder {
                start: self.start_byte,
                end: self.end_byte,
            });
        }

        if self.end_byte > source.len() {
            return Err(FixError::InvalidRange {
                start: self.start_byte,
                end: self.end_byte,
                source_len: source.len(),
            });
        }

        if !source.is_char_boundary(self.start_byte) || !source.is_char_boundary(self.end_byte) {
            return Err(FixError::NotCharBoundary {
                start: self.start_byte,
                end: self.end_byte,
            });
        }

        Ok(())
    }
}

/// Validate that edits are in bounds and pairwise disjoint.
pub fn validate_edits(edits: &[TextEdit], source: &str) -> Result<(), FixError> {
    for edit in edits {
        edit.validate(source)?;
    }

    for (i, a) in edits.iter().enumerate() {
        if let Some(b) = edits[i + 1..].iter().find(|b| a.overlaps_with(b)) {
            return Err(FixError::OverlappingEdits(a.start_byte.max(b.start_byte)));
        }
    }

    Ok(())
}

/// Apply disjoint edits, in any order, from the end of the text backwards.
pub fn apply_edits(source: &str, edits: &[TextEdit]) -> Result<String, FixError> {
    if edits.is_empty() {
        return Ok(source.to_string());
    }

    validate_edits(edits, source)?;

    let mut sorted = edits.to_vec();
    sorted.sort_by(|a, b| b.start_byte.cmp(&a.start_byte));

    let mut result = source.to_string();
    for edit in sorted {
        result.replace_range(edit.range(), &edit.replacement);
    }

    Ok(result)
}

/// Outcome of one fix pass over a file.
#[derive(Debug)]
pub struct FixResult {
    pub fixed_source: String,
    pub fixes_applied: usize,
    /// Suggestions not applied because their applicability was too weak.
    pub fixes_skipped: usize,
    /// Suggestions nested inside an applied edit; a later pass handles them.
    pub fixes_deferred: usize,
}

impl FixResult {
    pub fn changed(&self) -> bool {
        self.fixes_applied > 0
    }
}

/// Apply the suggestions carried by `diagnostics`.
///
/// `MaybeIncorrect` suggestions are applied only when `allow_unsafe` is set.
/// Of any group of overlapping edits, the one starting first (and, on ties,
/// the longest) wins.
pub fn apply_fixes(
    source: &str,
    diagnostics: &[Diagnostic],
    allow_unsafe: bool,
) -> Result<FixResult, FixError> {
    let mut candidates: Vec<TextEdit> = Vec::new();
    let mut skipped = 0;

    for diag in diagnostics {
        let Some(suggestion) = &diag.suggestion else {
            continue;
        };

        match suggestion.applicability {
            Applicability::MachineApplicable => {}
            Applicability::MaybeIncorrect => {
                if !allow_unsafe {
                    skipped += 1;
                    continue;
                }
            }
        }

        let edit = TextEdit::new(diag.range.start, diag.range.end, &suggestion.replacement);
        edit.validate(source)?;
        candidates.push(edit);
    }

    candidates.sort_by(|a, b| {
        a.start_byte
            .cmp(&b.start_byte)
            .then(b.end_byte.cmp(&a.end_byte))
    });

    let mut edits: Vec<TextEdit> = Vec::with_capacity(candidates.len());
    let mut deferred = 0;
    for edit in candidates {
        if edits.last().is_some_and(|kept| kept.overlaps_with(&edit)) {
            deferred += 1;
            continue;
        }
        edits.push(edit);
    }

    let fixed_source = apply_edits(source, &edits)?;
    Ok(FixResult {
        fixed_source,
        fixes_applied: edits.len(),
        fixes_skipped: skipped,
        fixes_deferred: deferred,
    })
}

/// Unified diff between `original` and `fixed` with three lines of context.
pub fn format_diff(original: &str, fixed: &str, path: &Path) -> String {
    format_diff_with_context(original, fixed, path, 3)
}

/// Unified diff with configurable context.
pub fn format_diff_with_context(
    original: &str,
    fixed: &str,
    path: &Path,
    context: usize,
) -> String {
    if original == fixed {
        return String::new();
    }
    let path = path.display();
    TextDiff::from_lines(original, fixed)
        .unified_diff()
        .context_radius(context)
        .header(&format!("a/{path}"), &format!("b/{path}"))
        .to_string()
}
