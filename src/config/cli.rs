use crate::domain::model::{Level, RowFilter};
use clap::{ArgGroup, Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "repokit")]
#[command(version)]
#[command(about = "Repository hygiene checks for pre-commit hooks, CI gates and release automation")]
pub struct CliConfig {
    /// Repository root (default: git toplevel, else current directory)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Configuration file (default: <root>/repokit.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// Force colored output
    #[arg(long, global = true, conflicts_with = "no_color")]
    pub color: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl CliConfig {
    /// `None` lets the palette auto-detect.
    pub fn color_override(&self) -> Option<bool> {
        match (self.color, self.no_color) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Fail if any given file contains NUL (0x00) bytes
    NulBytes(NulBytesArgs),
    /// Report remaining customization TODO comments
    Todos(TodosArgs),
    /// Move completed `- [x]` items from the todo file to the archive
    ArchiveTodos(ArchiveArgs),
    /// Verify CHANGELOG headings match git tags
    Changelog(ChangelogArgs),
    /// Audit and update SHA-pinned GitHub Actions
    Workflows(WorkflowsArgs),
    /// Warn-only repository structure checks from .repo-doctor.toml
    Doctor(DoctorArgs),
    /// Remove build artifacts and caches
    Clean(CleanArgs),
    /// Print an environment diagnostics bundle for bug reports
    Diagnostics(DiagnosticsArgs),
    /// Create or update GitHub labels from a JSON label set
    Labels(LabelsArgs),
    /// Rewrite docs links that escape the docs directory to GitHub URLs
    Links(LinksArgs),
}

#[derive(Debug, Clone, Args)]
pub struct NulBytesArgs {
    /// Files to check (as passed by pre-commit)
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Clone, Args)]
#[command(group(ArgGroup::new("output").args(["count", "json", "csv"])))]
pub struct TodosArgs {
    /// Text pattern to search for (case-insensitive)
    #[arg(long)]
    pub pattern: Option<String>,

    /// Only print the count of TODOs found
    #[arg(long)]
    pub count: bool,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,

    /// Output results as CSV (file,line,text)
    #[arg(long)]
    pub csv: bool,

    /// Additional path prefixes to exclude, relative to the root
    #[arg(long)]
    pub exclude: Vec<String>,

    /// Suppress output; the exit code still reports the result
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Args)]
pub struct ArchiveArgs {
    /// Show what would change without modifying files
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Args)]
pub struct ChangelogArgs {
    /// Also list versions that are in sync
    #[arg(long)]
    pub list_synced: bool,

    /// Output the comparison as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Args)]
pub struct WorkflowsArgs {
    #[command(subcommand)]
    pub command: Option<WorkflowsCommand>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum WorkflowsCommand {
    /// Show pinned actions with comment, resolved and latest tags (default)
    Show(ShowArgs),
    /// Rewrite inline comments as `# <description> (vX.Y.Z)`
    UpdateComments,
    /// Upgrade actions to their latest release or a given tag
    Upgrade(UpgradeArgs),
}

#[derive(Debug, Clone, Default, Args)]
pub struct ShowArgs {
    /// Skip the GitHub API; only show comment tags
    #[arg(long)]
    pub offline: bool,

    /// Output rows as JSON
    #[arg(long)]
    pub json: bool,

    /// Which rows to show
    #[arg(long, value_enum, default_value_t = RowFilter::All)]
    pub filter: RowFilter,

    /// Print nothing; exit 1 when any row needs attention
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Args)]
pub struct UpgradeArgs {
    /// Action to upgrade (e.g. actions/checkout); omit for all
    pub action: Option<String>,

    /// Target tag (e.g. v6.1.0); omit for latest
    #[arg(value_name = "VERSION")]
    pub tag: Option<String>,

    /// Show what would be upgraded without modifying files
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Args)]
pub struct DoctorArgs {
    /// Report missing files/dirs in the working tree
    #[arg(long)]
    pub missing: bool,

    /// Report staged deletions
    #[arg(long)]
    pub staged: bool,

    /// Report deletions in a git diff range, e.g. "origin/main...HEAD"
    #[arg(long, value_name = "RANGE")]
    pub diff: Option<String>,

    /// Only show rules in this category
    #[arg(long, value_name = "CAT")]
    pub category: Option<String>,

    /// Minimum severity to display
    #[arg(long, value_enum, default_value_t = Level::Warn)]
    pub min_level: Level,

    /// Include info-level checks (same as --min-level info)
    #[arg(long)]
    pub include_info: bool,

    /// Load rules from repo_doctor.d/NAME.toml ('all' loads every profile)
    #[arg(long, value_name = "NAME")]
    pub profile: Vec<String>,

    /// Hide hint lines
    #[arg(long)]
    pub no_hints: bool,

    /// Hide link lines
    #[arg(long)]
    pub no_links: bool,

    /// Show auto-fix commands
    #[arg(long)]
    pub fix: bool,
}

#[derive(Debug, Clone, Args)]
pub struct CleanArgs {
    /// Show what would be removed without deleting
    #[arg(long)]
    pub dry_run: bool,

    /// Also remove .venv* directories
    #[arg(long)]
    pub include_venv: bool,

    /// Skip the confirmation prompt for --include-venv
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Debug, Clone, Args)]
#[command(group(ArgGroup::new("format").args(["markdown", "json"])))]
pub struct DiagnosticsArgs {
    /// Also write the report to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Markdown output for GitHub issues
    #[arg(long)]
    pub markdown: bool,

    /// JSON output
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Args)]
pub struct LabelsArgs {
    /// Label set name; reads labels/<SET>.json
    #[arg(long)]
    pub set: String,

    /// OWNER/REPO (default: parsed from the origin remote)
    #[arg(long)]
    pub repo: Option<String>,

    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Args)]
pub struct LinksArgs {
    /// Markdown files under the docs directory (default: all *.md there)
    pub files: Vec<PathBuf>,

    /// Repository URL (overrides [links].repo_url)
    #[arg(long)]
    pub repo_url: Option<String>,

    /// Branch used in rewritten URLs
    #[arg(long)]
    pub branch: Option<String>,

    /// Docs directory, relative to the root
    #[arg(long)]
    pub docs_dir: Option<String>,

    /// Save rewritten files in place
    #[arg(long)]
    pub write: bool,

    /// Exit 1 if any link would be rewritten
    #[arg(long, conflicts_with = "write")]
    pub check: bool,
}
