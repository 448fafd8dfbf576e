use crate::diagnostics::{Diagnostic, Span, Suggestion};
use crate::level::LintLevel;
use crate::rewrite::CastFix;
use crate::suppression::SuppressionIndex;

/// Safety classification for auto-fixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FixSafety {
    /// Applied by default with `--fix`.
    #[default]
    Safe,
    /// Requires `--unsafe-fixes`.
    Unsafe,
}

impl FixSafety {
    pub fn as_str(&self) -> &'static str {
        match self {
            FixSafety::Safe => "safe",
            FixSafety::Unsafe => "unsafe",
        }
    }
}

/// Descriptor for an auto-fix associated with a lint rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixDescriptor {
    pub safety: FixSafety,
    pub description: &'static str,
}

/// Static metadata describing a lint rule.
#[derive(Debug)]
pub struct LintDescriptor {
    pub name: &'static str,
    pub category: &'static str,
    pub description: &'static str,
    pub fix: FixDescriptor,
}

/// The functional-cast migration check.
pub static FUNCTIONAL_CASTS: LintDescriptor = LintDescriptor {
    name: "functional-casts",
    category: "modernization",
    description: "Prefer `llvm::cast<T>(x)`, `llvm::isa<T>(x)` and friends over the deprecated \
                  `x.cast<T>()` member functions on MLIR attributes, types, values, ops and \
                  `llvm::PointerUnion`",
    fix: FixDescriptor {
        safety: FixSafety::Safe,
        description: "Rewrite the member call into the free-function form, renaming \
                      `dyn_cast_or_null` (and `PointerUnion::dyn_cast`) to `dyn_cast_if_present`",
    },
};

/// Per-run settings derived from configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LintSettings {
    pub level: LintLevel,
}

impl LintSettings {
    #[must_use]
    pub fn with_level(mut self, level: LintLevel) -> Self {
        self.level = level;
        self
    }
}

/// Mutable context collecting diagnostics for one file.
pub struct LintContext<'src> {
    source: &'src str,
    settings: LintSettings,
    suppressions: SuppressionIndex,
    diagnostics: Vec<Diagnostic>,
    suppressed: usize,
}

impl<'src> LintContext<'src> {
    pub fn new(source: &'src str, settings: LintSettings) -> Self {
        Self {
            source,
            settings,
            suppressions: SuppressionIndex::new(source),
            diagnostics: Vec::new(),
            suppressed: 0,
        }
    }

    /// Report a rewrite, honoring the configured level and `NOLINT` comments.
    pub fn report_fix(&mut self, fix: CastFix) {
        let lint = &FUNCTIONAL_CASTS;
        if self.settings.level == LintLevel::Allow {
            return;
        }

        let span = Span::from_byte_range(self.source, &fix.range);
        if self.suppressions.is_suppressed(span.start.row, lint.name) {
            self.suppressed += 1;
            return;
        }

        self.diagnostics.push(Diagnostic {
            lint,
            level: self.settings.level,
            file: None,
            span,
            range: fix.range,
            message: fix.message.to_string(),
            help: Some(format!("replace with `{}`", fix.replacement)),
            suggestion: Some(Suggestion {
                message: lint.fix.description.to_string(),
                replacement: fix.replacement,
                applicability: fix.applicability,
            }),
        });
    }

    /// Number of findings dropped because of `NOLINT` comments.
    pub fn suppressed(&self) -> usize {
        self.suppressed
    }

    #[must_use]
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}
