use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// cast-migrate CLI options.
#[derive(Debug, Parser)]
#[command(
    name = "cast-migrate",
    version,
    about = "Rewrite deprecated `x.cast<T>()` member casts into `llvm::cast<T>(x)` calls",
    args_conflicts_with_subcommands = true,
    subcommand_precedence_over_arg = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub check: CheckArgs,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check (and optionally fix) files or directories.
    Check(CheckArgs),

    /// Report and fix call sites listed by an external detector.
    ApplyMatches(ApplyMatchesArgs),

    /// Print the free-function form of a single call.
    Rewrite(RewriteArgs),

    /// List the receiver families the check knows about.
    Families,

    /// Explain the check.
    Explain,
}

#[derive(Debug, Clone, ClapArgs)]
pub struct CheckArgs {
    /// Files/directories to check. Defaults to stdin when absent.
    #[arg(value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    #[command(flatten)]
    pub output: OutputArgs,

    #[command(flatten)]
    pub fix: FixArgs,

    /// Path to a `cast-migrate.toml` (otherwise discovered from the first PATH).
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Skip calls whose receiver type cannot be resolved.
    #[arg(long)]
    pub strict: bool,
}

#[derive(Debug, Clone, ClapArgs)]
pub struct ApplyMatchesArgs {
    /// JSON file with the matches.
    #[arg(value_name = "FILE.json")]
    pub matches: PathBuf,

    #[command(flatten)]
    pub output: OutputArgs,

    #[command(flatten)]
    pub fix: FixArgs,

    /// Path to a `cast-migrate.toml` (otherwise discovered next to the matches file).
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, ClapArgs)]
pub struct RewriteArgs {
    /// Literal call text, e.g. `op.cast<FooOp>()`.
    #[arg(value_name = "CALL_TEXT")]
    pub call: String,

    /// The call uses `->` access (or is an implicit `this` call).
    #[arg(long)]
    pub arrow: bool,

    /// Receiver family, e.g. `::llvm::PointerUnion`.
    #[arg(long, value_name = "NAME")]
    pub family: Option<String>,

    /// Method name; inferred from the call text when absent.
    #[arg(long, value_name = "NAME")]
    pub member: Option<String>,
}

#[derive(Debug, Clone, Copy, ClapArgs)]
pub struct OutputArgs {
    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
    pub format: OutputFormat,

    /// Exit with code 1 if any diagnostics are emitted.
    #[arg(long)]
    pub deny_warnings: bool,
}

#[derive(Debug, Clone, Copy, ClapArgs)]
pub struct FixArgs {
    /// Rewrite files in place.
    #[arg(long)]
    pub fix: bool,

    /// Print a diff of the rewrites instead of writing them.
    #[arg(long, conflicts_with = "fix")]
    pub fix_dry_run: bool,

    /// Also apply rewrites that may be incorrect.
    #[arg(long)]
    pub unsafe_fixes: bool,

    /// Do not write `.bak` copies of modified files.
    #[arg(long)]
    pub no_backup: bool,
}

impl FixArgs {
    pub fn enabled(&self) -> bool {
        self.fix || self.fix_dry_run
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Pretty,
    Json,
    Github,
}
