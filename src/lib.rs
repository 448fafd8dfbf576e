//! Migration of deprecated method-style casts to free-function casts.
//!
//! Call sites such as `op.cast<FooOp>()` or `ty->isa<IntegerType>()` on MLIR
//! attributes, types, values, ops and `llvm::PointerUnion` are rewritten to
//! `llvm::cast<FooOp>(op)` / `llvm::isa<IntegerType>(*ty)`.
//!
//! [`CastEngine`] ties the pieces together: a [`detect::CallSiteDetector`]
//! finds the calls, [`rewrite::CastRewriter`] produces the replacement text and
//! [`lint::LintContext`] turns each rewrite into a [`Diagnostic`], honoring
//! the configured level and `NOLINT` comments.

pub mod cli;
pub mod config;
pub mod detect;
pub mod diagnostics;
pub mod error;
pub mod families;
pub mod fix;
pub mod level;
pub mod lint;
pub mod parser;
pub mod rewrite;
pub mod suppression;
pub mod telemetry;

use crate::config::CastMigrateConfig;
use crate::detect::{CallSiteDetector, MemberCallDetector, UnresolvedReceivers};
use crate::diagnostics::Diagnostic;
use crate::error::CastResult;
use crate::families::FamilyTable;
use crate::lint::{LintContext, LintSettings};
use crate::parser::parse_source;
use crate::rewrite::{CastRewriter, FunctionNormalizer, MatchedCall};

/// Engine orchestrating detection, rewriting and reporting for one source text.
pub struct CastEngine {
    detector: MemberCallDetector,
    rewriter: CastRewriter,
    settings: LintSettings,
}

impl CastEngine {
    pub fn new(detector: MemberCallDetector, rewriter: CastRewriter, settings: LintSettings) -> Self {
        Self {
            detector,
            rewriter,
            settings,
        }
    }

    /// Build an engine from a loaded `cast-migrate.toml`.
    pub fn from_config(cfg: &CastMigrateConfig) -> Self {
        let families = FamilyTable::builtin();
        Self::new(
            MemberCallDetector::new(families.clone(), cfg.detector.unresolved_receivers),
            CastRewriter::new(families, FunctionNormalizer::new(cfg.check.namespace.clone())),
            LintSettings::default().with_level(cfg.check.level),
        )
    }

    pub fn rewriter(&self) -> &CastRewriter {
        &self.rewriter
    }

    pub fn settings(&self) -> LintSettings {
        self.settings
    }

    /// Detect and report every deprecated cast in `source`.
    pub fn lint_source(&self, source: &str) -> CastResult<Vec<Diagnostic>> {
        let tree = parse_source(source)?;
        let matches = crate::instrument_block!("detect", {
            self.detector.match_call_sites(source, &tree)
        });
        Ok(self.diagnostics_for_matches(source, &matches))
    }

    /// Report matches found by some other detector.
    ///
    /// Matches whose range does not fit `source` are dropped with a warning.
    pub fn diagnostics_for_matches(&self, source: &str, matches: &[MatchedCall]) -> Vec<Diagnostic> {
        let mut ctx = LintContext::new(source, self.settings);

        for call in matches {
            let Some(text) = call.source_text(source) else {
                tracing::warn!(
                    start = call.full_range.start,
                    end = call.full_range.end,
                    "match range does not fit the source; skipping"
                );
                continue;
            };
            ctx.report_fix(self.rewriter.rewrite(call, text));
        }

        if ctx.suppressed() > 0 {
            tracing::debug!(count = ctx.suppressed(), "suppressed by NOLINT comments");
        }

        let mut diagnostics = ctx.into_diagnostics();
        diagnostics.sort_by_key(|d| (d.range.start, std::cmp::Reverse(d.range.end)));
        diagnostics
    }
}

/// Construct a `CastEngine` with the default configuration.
pub fn create_default_engine() -> CastEngine {
    CastEngine::from_config(&CastMigrateConfig::default())
}

/// Default engine that leaves calls with unresolved receivers alone.
pub fn create_strict_engine() -> CastEngine {
    let mut cfg = CastMigrateConfig::default();
    cfg.detector.unresolved_receivers = UnresolvedReceivers::Skip;
    CastEngine::from_config(&cfg)
}
