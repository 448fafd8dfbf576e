use anyhow::Context;
use cast_migrate::CastEngine;
use cast_migrate::cli::{
    ApplyMatchesArgs, Args, CheckArgs, Command, FixArgs, OutputArgs, OutputFormat, RewriteArgs,
};
use cast_migrate::config::{self, CastMigrateConfig, FilesConfig};
use cast_migrate::detect::UnresolvedReceivers;
use cast_migrate::detect::external::{self, ExternalMatch};
use cast_migrate::diagnostics::{Applicability, Diagnostic};
use cast_migrate::families::TRACKED_METHODS;
use cast_migrate::fix::{self, FixError};
use cast_migrate::level::LintLevel;
use cast_migrate::lint::FUNCTIONAL_CASTS;
use cast_migrate::rewrite::MatchedCall;
use clap::Parser;
use itertools::Itertools;
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use walkdir::WalkDir;

/// Re-lint passes per file; nested casts need one pass per nesting level.
const MAX_ITERATIONS: usize = 10;

fn main() -> ExitCode {
    cast_migrate::telemetry::init_tracing();
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::from(2)
        }
    }
}

fn run() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    match args.command {
        Some(Command::Families) => {
            list_families();
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::Explain) => {
            explain();
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::Rewrite(rewrite)) => rewrite_command(rewrite),
        Some(Command::ApplyMatches(apply)) => apply_matches_command(apply),
        Some(Command::Check(check)) => check_command(check),
        None => check_command(args.check),
    }
}

fn list_families() {
    let engine = cast_migrate::create_default_engine();
    for family in engine
        .rewriter()
        .families()
        .iter()
        .sorted_by_key(|f| f.qualified_name)
    {
        let renaming = if family.requires_generic_pointer_renaming {
            "\tdyn_cast -> dyn_cast_if_present"
        } else {
            ""
        };
        println!("{}{}", family.qualified_name, renaming);
    }
}

fn explain() {
    let d = &FUNCTIONAL_CASTS;
    println!("name: {}", d.name);
    println!("category: {}", d.category);
    println!("description: {}", d.description);
    println!("methods: {}", TRACKED_METHODS.iter().join(", "));
    println!("fix: available ({})", d.fix.safety.as_str());
    println!("fix description: {}", d.fix.description);
}

fn rewrite_command(args: RewriteArgs) -> anyhow::Result<ExitCode> {
    let member = match args.member {
        Some(member) => member,
        None => infer_member(&args.call)
            .with_context(|| format!("no cast method found in `{}`", args.call))?
            .to_string(),
    };

    let engine = cast_migrate::create_default_engine();
    let rewriter = engine.rewriter();
    if let Some(name) = args.family.as_deref()
        && rewriter.families().get(name).is_none()
    {
        anyhow::bail!("unknown type family: {name}");
    }

    let fix = rewriter.rewrite_text(&args.call, &member, args.arrow, args.family.as_deref());
    println!("{}", fix.replacement);
    if fix.applicability != Applicability::MachineApplicable {
        let reason = if args.family.is_none() && member == "dyn_cast" {
            "pass --family; `llvm::PointerUnion` receivers need `dyn_cast_if_present`"
        } else {
            "the function could not be isolated"
        };
        eprintln!("note: rewrite is {} ({reason})", fix.applicability.as_str());
    }
    Ok(ExitCode::SUCCESS)
}

/// The tracked method named in `call`, preferring the longest spelling.
fn infer_member(call: &str) -> Option<&'static str> {
    TRACKED_METHODS
        .iter()
        .copied()
        .sorted_by_key(|m| std::cmp::Reverse(m.len()))
        .find(|m| call.contains(&format!("{m}<")))
}

fn check_command(args: CheckArgs) -> anyhow::Result<ExitCode> {
    let start_dir = infer_start_dir(&args.paths)?;
    let mut cfg = load_config(args.config.as_deref(), &start_dir)?;
    if args.strict {
        cfg.detector.unresolved_receivers = UnresolvedReceivers::Skip;
    }
    let engine = CastEngine::from_config(&cfg);

    if args.fix.enabled() {
        return fix_command(&args, &engine, &cfg.files);
    }

    let mut report = Report::new(args.output);

    if args.paths.is_empty() {
        let mut source = String::new();
        std::io::stdin().read_to_string(&mut source)?;
        let diagnostics = engine.lint_source(&source)?;
        report.add("stdin", &source, &diagnostics);
    } else {
        for path in collect_source_files(&args.paths, &cfg.files)? {
            let source = read_source(&path)?;
            let diagnostics = engine.lint_source(&source)?;
            report.add(&path.display().to_string(), &source, &diagnostics);
        }
    }

    report.finish()
}

/// Handle `--fix` / `--fix-dry-run`: rewrite files until no call is left.
fn fix_command(
    args: &CheckArgs,
    engine: &CastEngine,
    files_cfg: &FilesConfig,
) -> anyhow::Result<ExitCode> {
    if args.paths.is_empty() {
        return Err(FixError::StdinNotSupported.into());
    }

    let files = collect_source_files(&args.paths, files_cfg)?;
    let mut summary = FixSummary::default();

    for path in &files {
        let original_source = read_source(path)?;
        let mut current_source = original_source.clone();
        let mut file_fixes = 0usize;
        let mut file_skipped = 0usize;
        let mut iterations = 0usize;

        loop {
            iterations += 1;
            if iterations > MAX_ITERATIONS {
                tracing::warn!(
                    path = %path.display(),
                    "max fix iterations ({MAX_ITERATIONS}) reached"
                );
                break;
            }

            let diagnostics = engine.lint_source(&current_source)?;
            if diagnostics.is_empty() {
                break;
            }

            let result = fix::apply_fixes(&current_source, &diagnostics, args.fix.unsafe_fixes)?;
            file_skipped = result.fixes_skipped;
            if !result.changed() {
                break;
            }

            file_fixes += result.fixes_applied;
            current_source = result.fixed_source;
        }

        summary.skipped += file_skipped;
        if file_fixes > 0 {
            summary.fixed += file_fixes;
            write_fixed(path, &original_source, &current_source, &args.fix)?;
            summary.files_modified += 1;
        }
    }

    summary.print(&args.fix);
    Ok(ExitCode::SUCCESS)
}

fn apply_matches_command(args: ApplyMatchesArgs) -> anyhow::Result<ExitCode> {
    let start_dir = infer_start_dir(std::slice::from_ref(&args.matches))?;
    let cfg = load_config(args.config.as_deref(), &start_dir)?;
    let engine = CastEngine::from_config(&cfg);

    let matches = external::load_matches(&args.matches)
        .with_context(|| format!("failed to load matches: {}", args.matches.display()))?;
    let grouped = external::group_by_file(matches);
    tracing::info!(files = grouped.len(), "loaded external matches");

    let mut report = Report::new(args.output);
    let mut summary = FixSummary::default();

    for (path, records) in grouped {
        let source = read_source(&path)?;
        let calls = to_matched_calls(&engine, &source, &records)?;
        let diagnostics = engine.diagnostics_for_matches(&source, &calls);

        if !args.fix.enabled() {
            report.add(&path.display().to_string(), &source, &diagnostics);
            continue;
        }

        // Offsets only describe the original text, so there is a single pass.
        let result = fix::apply_fixes(&source, &diagnostics, args.fix.unsafe_fixes)?;
        summary.skipped += result.fixes_skipped;
        summary.deferred += result.fixes_deferred;
        if result.changed() {
            summary.fixed += result.fixes_applied;
            write_fixed(&path, &source, &result.fixed_source, &args.fix)?;
            summary.files_modified += 1;
        }
    }

    if args.fix.enabled() {
        summary.print(&args.fix);
        return Ok(ExitCode::SUCCESS);
    }
    report.finish()
}

fn to_matched_calls(
    engine: &CastEngine,
    source: &str,
    records: &[ExternalMatch],
) -> anyhow::Result<Vec<MatchedCall>> {
    records
        .iter()
        .map(|record| {
            record
                .to_matched_call(source, engine.rewriter().families())
                .map_err(|err| err.into_anyhow())
        })
        .collect()
}

fn write_fixed(path: &Path, original: &str, fixed: &str, fix_args: &FixArgs) -> anyhow::Result<()> {
    if fix_args.fix_dry_run {
        let diff = fix::format_diff(original, fixed, path);
        if !diff.is_empty() {
            println!("{diff}");
        }
        return Ok(());
    }

    if !fix_args.no_backup {
        let backup_path = path.with_extension(format!(
            "{}.bak",
            path.extension().unwrap_or_default().to_string_lossy()
        ));
        std::fs::write(&backup_path, original)
            .with_context(|| format!("failed to write backup: {}", backup_path.display()))?;
    }

    std::fs::write(path, fixed).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

#[derive(Debug, Default)]
struct FixSummary {
    fixed: usize,
    skipped: usize,
    deferred: usize,
    files_modified: usize,
}

impl FixSummary {
    fn print(&self, fix_args: &FixArgs) {
        if fix_args.fix_dry_run {
            println!(
                "\n{} fix(es) would be applied to {} file(s)",
                self.fixed, self.files_modified
            );
        } else {
            println!(
                "Applied {} fix(es) to {} file(s)",
                self.fixed, self.files_modified
            );
        }
        if self.skipped > 0 {
            println!(
                "{} fix(es) skipped (use --unsafe-fixes to apply)",
                self.skipped
            );
        }
        if self.deferred > 0 {
            println!(
                "{} nested fix(es) deferred (re-run the detector on the fixed files)",
                self.deferred
            );
        }
        tracing::info!(
            fixed = self.fixed,
            skipped = self.skipped,
            deferred = self.deferred,
            files = self.files_modified,
            "fix run finished"
        );
    }
}

#[derive(Debug, Serialize)]
struct JsonDiagnostic {
    file: String,
    row: usize,
    column: usize,
    end_row: usize,
    end_column: usize,
    level: String,
    lint: String,
    message: String,
    replacement: Option<String>,
    applicability: Option<String>,
}

impl JsonDiagnostic {
    fn new(file: &str, d: &Diagnostic) -> Self {
        Self {
            file: d.file.clone().unwrap_or_else(|| file.to_string()),
            row: d.span.start.row,
            column: d.span.start.column,
            end_row: d.span.end.row,
            end_column: d.span.end.column,
            level: d.level.as_str().to_string(),
            lint: d.lint.name.to_string(),
            message: d.message.clone(),
            replacement: d.suggestion.as_ref().map(|s| s.replacement.clone()),
            applicability: d
                .suggestion
                .as_ref()
                .map(|s| s.applicability.as_str().to_string()),
        }
    }
}

/// Accumulates output across files and computes the exit code.
struct Report {
    output: OutputArgs,
    total_diags: usize,
    has_error: bool,
    json: Vec<JsonDiagnostic>,
}

impl Report {
    fn new(output: OutputArgs) -> Self {
        Self {
            output,
            total_diags: 0,
            has_error: false,
            json: Vec::new(),
        }
    }

    fn add(&mut self, file: &str, source: &str, diagnostics: &[Diagnostic]) {
        self.total_diags += diagnostics.len();

        match self.output.format {
            OutputFormat::Json => {
                self.json
                    .extend(diagnostics.iter().map(|d| JsonDiagnostic::new(file, d)));
                self.has_error |= diagnostics.iter().any(|d| d.level == LintLevel::Error);
            }
            OutputFormat::Pretty => {
                for diag in diagnostics {
                    print!("{}", format_pretty(file, source, diag));
                    self.has_error |= diag.level == LintLevel::Error;
                }
                println!("{} diagnostics for {}", diagnostics.len(), file);
            }
            OutputFormat::Github => {
                for diag in diagnostics {
                    let kind = if diag.level == LintLevel::Error
                        || (self.output.deny_warnings && diag.level == LintLevel::Warn)
                    {
                        "error"
                    } else {
                        "warning"
                    };
                    println!(
                        "::{} file={},line={},col={},endLine={},endColumn={},title={}::{}",
                        kind,
                        github_escape(file),
                        diag.span.start.row,
                        diag.span.start.column,
                        diag.span.end.row,
                        diag.span.end.column,
                        diag.lint.name,
                        github_escape(&diag.message)
                    );
                    self.has_error |= kind == "error";
                }
            }
        }
    }

    fn finish(mut self) -> anyhow::Result<ExitCode> {
        if self.output.format == OutputFormat::Json {
            self.json.sort_by(|a, b| {
                (a.file.as_str(), a.row, a.column).cmp(&(b.file.as_str(), b.row, b.column))
            });
            println!("{}", serde_json::to_string_pretty(&self.json)?);
        }

        if self.has_error || (self.output.deny_warnings && self.total_diags > 0) {
            Ok(ExitCode::from(1))
        } else {
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// `file:row:col: level: lint: message`, followed by the source line and the
/// suggested replacement.
fn format_pretty(file: &str, source: &str, diag: &Diagnostic) -> String {
    let mut out = format!(
        "{}:{}:{}: {}: {}: {}\n",
        file,
        diag.span.start.row,
        diag.span.start.column,
        diag.level.as_str(),
        diag.lint.name,
        diag.message
    );
    if let Some(line) = source.lines().nth(diag.span.start.row.saturating_sub(1)) {
        out.push_str(&format!("  | {line}\n"));
    }
    if let Some(help) = &diag.help {
        out.push_str(&format!("  = help: {help}\n"));
    }
    out
}

fn github_escape(s: &str) -> String {
    s.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

fn read_source(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn load_config(explicit: Option<&Path>, start_dir: &Path) -> anyhow::Result<CastMigrateConfig> {
    Ok(config::load_config(explicit, start_dir)?
        .map(|(_path, cfg)| cfg)
        .unwrap_or_default())
}

/// Explicit file arguments are always checked; directories are walked for
/// files with a configured extension, skipping excluded directory names.
fn collect_source_files(paths: &[PathBuf], files_cfg: &FilesConfig) -> anyhow::Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for path in paths {
        let meta = std::fs::metadata(path)
            .with_context(|| format!("failed to access {}", path.display()))?;
        if !meta.is_dir() {
            out.push(path.clone());
            continue;
        }

        let walker = WalkDir::new(path).into_iter().filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !files_cfg.is_excluded_dir(entry.path())
        });
        for entry in walker {
            let entry = entry?;
            if entry.file_type().is_file() && files_cfg.is_source_file(entry.path()) {
                out.push(entry.into_path());
            }
        }
    }

    out.sort();
    out.dedup();
    Ok(out)
}

fn infer_start_dir(paths: &[PathBuf]) -> anyhow::Result<PathBuf> {
    let base = match paths.first() {
        Some(p) => p.clone(),
        None => std::env::current_dir()?,
    };

    let base = if base.is_file() {
        base.parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    } else {
        base
    };

    Ok(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_longest_member_name() {
        assert_eq!(infer_member("p.dyn_cast_or_null<T>()"), Some("dyn_cast_or_null"));
        assert_eq!(infer_member("p->dyn_cast<T>()"), Some("dyn_cast"));
        assert_eq!(infer_member("p.isa<A, B>()"), Some("isa"));
        assert_eq!(infer_member("p.foo()"), None);
    }

    #[test]
    fn github_escape_encodes_newlines() {
        assert_eq!(github_escape("a%b\nc"), "a%25b%0Ac");
    }
}
