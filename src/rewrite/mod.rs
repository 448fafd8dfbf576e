//! Text-level rewriting of method-style casts into free-function casts.
//!
//! The pipeline only ever looks at the literal text of a matched call:
//!
//! 1. [`split`] cuts the call head into an object half and a function half.
//! 2. [`object`] turns the object half into the argument of the new call.
//! 3. [`function`] strips `template`, unifies the legacy nullable-cast
//!    spellings and injects the namespace qualifier.
//! 4. [`emit`] glues both halves together and closes the argument list.
//!
//! None of these steps parse the object expression. Where the text is
//! ambiguous the pipeline still produces a best-effort replacement; see the
//! individual modules for the known gaps.

pub mod emit;
pub mod function;
pub mod object;
pub mod split;

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::families::FamilyTable;

pub use emit::{CastFix, DEPRECATION_MESSAGE, emit_patch};
pub use function::{CANONICAL_NULLABLE_CAST, DEFAULT_NAMESPACE, FunctionNormalizer, LEGACY_NULLABLE_CAST};
pub use object::normalize_object_text;
pub use split::{SplitResult, call_head, split_call};

/// Byte offsets, relative to the start of the call, that separate the
/// receiver expression from the called method.
///
/// Detectors that have the receiver node at hand supply this so the splitter
/// does not need to guess where the object expression ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitHint {
    /// End of the receiver expression (exclusive).
    pub object_end: usize,
    /// Start of the method name, after the `.`/`->` token.
    pub function_start: usize,
}

/// One detector match, consumed exactly once by the rewriter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedCall {
    /// Byte range of the whole call expression, closing parenthesis included.
    pub full_range: Range<usize>,
    /// Name of the matched method (`cast`, `dyn_cast`, `isa`, ...).
    pub member_name: String,
    /// `true` for `ptr->method<T>()`, and for implicit `this` calls.
    pub is_arrow_access: bool,
    /// Whether the receiver belongs to a family that renames `dyn_cast`.
    pub is_generic_pointer_family: bool,
    /// Written receiver type the detector resolved, if any.
    pub receiver_type: Option<String>,
    pub split_hint: Option<SplitHint>,
    /// The family could not be determined and the ordinary family was
    /// assumed. `dyn_cast` rewrites of such calls may need the
    /// `dyn_cast_if_present` spelling instead.
    pub family_assumed: bool,
}

impl MatchedCall {
    pub fn new(
        full_range: Range<usize>,
        member_name: impl Into<String>,
        is_arrow_access: bool,
        is_generic_pointer_family: bool,
    ) -> Self {
        Self {
            full_range,
            member_name: member_name.into(),
            is_arrow_access,
            is_generic_pointer_family,
            receiver_type: None,
            split_hint: None,
            family_assumed: false,
        }
    }

    #[must_use]
    pub fn with_split_hint(mut self, hint: SplitHint) -> Self {
        self.split_hint = Some(hint);
        self
    }

    #[must_use]
    pub fn assuming_ordinary_family(mut self) -> Self {
        self.family_assumed = true;
        self
    }

    #[must_use]
    pub fn with_receiver_type(mut self, ty: impl Into<String>) -> Self {
        self.receiver_type = Some(ty.into());
        self
    }

    /// The literal source text covered by this match.
    ///
    /// Returns `None` when the range is out of bounds or not on a UTF-8
    /// character boundary.
    pub fn source_text<'a>(&self, source: &'a str) -> Option<&'a str> {
        source.get(self.full_range.clone())
    }
}

/// Runs the whole split/normalize/emit pipeline for one match.
///
/// The rewriter owns the immutable family table so that matches coming from
/// external detectors can be classified by family name.
#[derive(Debug, Clone)]
pub struct CastRewriter {
    families: FamilyTable,
    functions: FunctionNormalizer,
}

impl Default for CastRewriter {
    fn default() -> Self {
        Self::new(FamilyTable::builtin(), FunctionNormalizer::default())
    }
}

impl CastRewriter {
    pub fn new(families: FamilyTable, functions: FunctionNormalizer) -> Self {
        Self {
            families,
            functions,
        }
    }

    pub fn families(&self) -> &FamilyTable {
        &self.families
    }

    /// Rewrite a match whose literal text is `text`.
    pub fn rewrite(&self, call: &MatchedCall, text: &str) -> CastFix {
        let head = call_head(text);
        let parts = match call.split_hint {
            Some(hint) => split::split_with_hint(head, hint)
                .unwrap_or_else(|| split_call(head, call.is_arrow_access, &call.member_name)),
            None => split_call(head, call.is_arrow_access, &call.member_name),
        };

        tracing::debug!(
            member = %call.member_name,
            object = %parts.object_text,
            function = %parts.function_text,
            arrow = call.is_arrow_access,
            "split call"
        );

        let object = normalize_object_text(
            &parts.object_text,
            &parts.function_text,
            call.is_arrow_access,
        );
        let function = self
            .functions
            .normalize(&parts.function_text, call.is_generic_pointer_family);

        let under_qualified = parts.function_text.trim().is_empty() && !call.is_arrow_access;
        let unknown_nullability = call.family_assumed && call.member_name == "dyn_cast";
        emit_patch(
            call.full_range.clone(),
            &function,
            &object,
            under_qualified || unknown_nullability,
        )
    }

    /// Rewrite a bare call text for a family given by name.
    ///
    /// Missing or unknown family names are treated as ordinary families.
    pub fn rewrite_text(
        &self,
        text: &str,
        member_name: &str,
        is_arrow_access: bool,
        family: Option<&str>,
    ) -> CastFix {
        let family = family.and_then(|name| self.families.get(name));
        let generic = family.is_some_and(|f| f.requires_generic_pointer_renaming);
        let mut call = MatchedCall::new(0..text.len(), member_name, is_arrow_access, generic);
        if family.is_none() {
            call = call.assuming_ordinary_family();
        }
        self.rewrite(&call, text)
    }
}
