use crate::utils::error::Result;
use crate::utils::fs::to_posix;
use glob::Pattern;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use walkdir::WalkDir;

pub const CACHE_ENTRIES: &[&str] = &[
    ".pytest_cache",
    ".mypy_cache",
    ".ruff_cache",
    ".coverage",
    "htmlcov",
    "site",
];
pub const BUILD_DIRS: &[&str] = &["dist", "build"];
pub const RECURSIVE_DIRS: &[&str] = &["__pycache__", "*.egg-info"];
pub const FILE_PATTERNS: &[&str] = &["*.pyc", "*.pyo", ".coverage", ".coverage.*"];

fn compile(patterns: &[&str]) -> Vec<Pattern> {
    patterns
        .iter()
        .map(|p| Pattern::new(p).expect("static glob"))
        .collect()
}

fn recursive_dir_patterns() -> &'static [Pattern] {
    static PATTERNS: OnceLock<Vec<Pattern>> = OnceLock::new();
    PATTERNS.get_or_init(|| compile(RECURSIVE_DIRS))
}

fn file_patterns() -> &'static [Pattern] {
    static PATTERNS: OnceLock<Vec<Pattern>> = OnceLock::new();
    PATTERNS.get_or_init(|| compile(FILE_PATTERNS))
}

fn matches_any(patterns: &[Pattern], name: &str) -> bool {
    patterns.iter().any(|p| p.matches(name))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Cache,
    Build,
    RecursiveDirs,
    Files,
    VirtualEnvs,
}

impl Phase {
    pub fn heading(self) -> &'static str {
        match self {
            Phase::Cache => "Cleaning cache directories...",
            Phase::Build => "Cleaning build directories...",
            Phase::RecursiveDirs => "Cleaning recursive directories...",
            Phase::Files => "Cleaning file patterns...",
            Phase::VirtualEnvs => "Cleaning virtual environments...",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanTarget {
    pub phase: Phase,
    pub path: PathBuf,
    /// Root-relative, forward slashes.
    pub rel: String,
    pub is_dir: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CleanOptions {
    pub dry_run: bool,
    pub include_venv: bool,
}

fn is_venv_name(name: &str) -> bool {
    name.starts_with(".venv")
}

fn target(root: &Path, phase: Phase, path: PathBuf) -> CleanTarget {
    let rel = to_posix(path.strip_prefix(root).unwrap_or(&path));
    CleanTarget {
        phase,
        is_dir: path.is_dir(),
        path,
        rel,
    }
}

/// Everything `clean` would remove, in phase order. Nothing below a planned
/// directory is listed separately.
pub fn plan(root: &Path, include_venv: bool) -> Vec<CleanTarget> {
    let mut targets = Vec::new();

    for (phase, names) in [(Phase::Cache, CACHE_ENTRIES), (Phase::Build, BUILD_DIRS)] {
        for name in names {
            let path = root.join(name);
            if path.exists() {
                targets.push(target(root, phase, path));
            }
        }
    }

    let mut venvs = Vec::new();
    if include_venv {
        if let Ok(entries) = std::fs::read_dir(root) {
            for entry in entries.flatten() {
                let path = entry.path();
                let is_venv = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(is_venv_name);
                if is_venv && path.is_dir() {
                    venvs.push(path);
                }
            }
        }
        venvs.sort();
    }

    let claimed: HashSet<PathBuf> = targets.iter().map(|t| t.path.clone()).chain(venvs.iter().cloned()).collect();

    let mut walker = WalkDir::new(root).sort_by_file_name().min_depth(1).into_iter();
    while let Some(entry) = walker.next() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        let name = entry.file_name().to_string_lossy();
        let is_dir = entry.file_type().is_dir();

        if claimed.contains(entry.path()) || name == ".git" || (is_dir && !include_venv && is_venv_name(&name)) {
            if is_dir {
                walker.skip_current_dir();
            }
            continue;
        }

        if is_dir && matches_any(recursive_dir_patterns(), &name) {
            targets.push(target(root, Phase::RecursiveDirs, entry.path().to_path_buf()));
            walker.skip_current_dir();
        } else if !is_dir && matches_any(file_patterns(), &name) {
            targets.push(target(root, Phase::Files, entry.path().to_path_buf()));
        }
    }

    targets.extend(venvs.into_iter().map(|v| target(root, Phase::VirtualEnvs, v)));
    targets.sort_by_key(|t| t.phase);
    targets
}

/// Removes (or in dry run only reports) every planned target.
pub fn clean(root: &Path, options: CleanOptions) -> Result<Vec<CleanTarget>> {
    let targets = plan(root, options.include_venv);
    if options.dry_run {
        return Ok(targets);
    }

    for t in &targets {
        if t.is_dir {
            std::fs::remove_dir_all(&t.path)?;
        } else {
            std::fs::remove_file(&t.path)?;
        }
        tracing::debug!("Removed {}", t.rel);
    }
    Ok(targets)
}

/// Per-phase listing followed by the `Removed N item(s).` summary.
pub fn render(targets: &[CleanTarget], options: CleanOptions) -> String {
    let verb = if options.dry_run { "Would remove" } else { "Removed" };
    let mut phases = vec![Phase::Cache, Phase::Build, Phase::RecursiveDirs, Phase::Files];
    if options.include_venv {
        phases.push(Phase::VirtualEnvs);
    }

    let mut out = Vec::new();
    for phase in phases {
        out.push(phase.heading().to_string());
        for t in targets.iter().filter(|t| t.phase == phase) {
            let kind = if t.is_dir { "directory" } else { "file" };
            out.push(format!("  {} {}: {}", verb, kind, t.rel));
        }
    }
    out.push(format!("\n{} {} item(s).", verb, targets.len()));
    out.join("\n")
}
