//! Patch emission.

use std::ops::Range;

use crate::diagnostics::Applicability;

/// Message attached to every rewrite.
pub const DEPRECATION_MESSAGE: &str =
    "Casting call is using methods instead of functions https://mlir.llvm.org/deprecation/";

/// A single replacement for one matched call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CastFix {
    /// Full byte range of the original call.
    pub range: Range<usize>,
    pub replacement: String,
    pub message: &'static str,
    pub applicability: Applicability,
}

/// Assemble the normalized halves into the replacement for `range`.
///
/// The function half ends with the opening parenthesis of the original call;
/// the object half becomes the only argument and the list is closed here.
/// `uncertain` marks rewrites that may not compile or may change meaning:
/// the dot-access fallback with no isolated function name, and `dyn_cast`
/// on a receiver whose family was assumed.
pub fn emit_patch(
    range: Range<usize>,
    function: &str,
    object: &str,
    uncertain: bool,
) -> CastFix {
    let applicability = if uncertain {
        Applicability::MaybeIncorrect
    } else {
        Applicability::MachineApplicable
    };

    CastFix {
        range,
        replacement: format!("{function}{object})"),
        message: DEPRECATION_MESSAGE,
        applicability,
    }
}
