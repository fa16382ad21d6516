use crate::utils::error::Result;
use crate::utils::fs::{relative_display, walk_files, Exclusions};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

pub const DEFAULT_EXCLUDE_DIRS: &[&str] = &[
    ".git",
    ".venv",
    ".venv-1",
    "__pycache__",
    ".mypy_cache",
    ".ruff_cache",
    ".pytest_cache",
    "node_modules",
    "site",
    "target",
];

pub const DEFAULT_EXCLUDE_SUFFIXES: &[&str] = &[".egg-info"];

const SCAN_EXTENSIONS: &[&str] = &[
    "rs", "py", "pyi", "toml", "yml", "yaml", "md", "rst", "txt", "cfg", "ini", "json", "sh",
    "ps1", "bat", "html", "css", "js", "ts", "sql", "env", "containerfile", "dockerfile",
];

const SCAN_FILENAMES: &[&str] = &[
    "Containerfile",
    "Dockerfile",
    "Makefile",
    "Taskfile",
    "Procfile",
    "Justfile",
];

const MAX_DISPLAY_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TodoMatch {
    pub line: usize,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TodoReport {
    pub total: usize,
    pub file_count: usize,
    pub files: BTreeMap<String, Vec<TodoMatch>>,
}

impl TodoReport {
    pub fn is_clean(&self) -> bool {
        self.total == 0
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_count_line(&self) -> String {
        format!("{} TODO(s) across {} file(s)", self.total, self.file_count)
    }

    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(["file", "line", "text"])?;
        for (file, matches) in &self.files {
            for m in matches {
                writer.write_record([file.as_str(), &m.line.to_string(), m.text.as_str()])?;
            }
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| crate::utils::error::KitError::IoError(e.into_error()))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn to_text(&self) -> String {
        if self.files.is_empty() {
            return "No TODOs found — template has been fully customized!".to_string();
        }

        let mut lines = vec![format!(
            "Found {} TODO(s) across {} file(s):\n",
            self.total, self.file_count
        )];
        for (file, matches) in &self.files {
            lines.push(format!("  {}", file));
            for m in matches {
                lines.push(format!("    L{}: {}", m.line, truncate_display(&m.text)));
            }
            lines.push(String::new());
        }
        lines.join("\n")
    }
}

fn truncate_display(text: &str) -> String {
    if text.chars().count() > MAX_DISPLAY_CHARS {
        let head: String = text.chars().take(MAX_DISPLAY_CHARS - 3).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

fn is_scannable(path: &Path) -> bool {
    let by_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| SCAN_FILENAMES.contains(&n));
    let by_ext = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| SCAN_EXTENSIONS.contains(&e));
    by_name || by_ext
}

pub fn default_exclusions<I, S>(extra_prefixes: I) -> Exclusions
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Exclusions::new(DEFAULT_EXCLUDE_DIRS, DEFAULT_EXCLUDE_SUFFIXES).with_prefixes(extra_prefixes)
}

/// Lines containing `pattern` (case-insensitive), grouped by root-relative path.
pub fn find_todos(root: &Path, pattern: &str, exclusions: &Exclusions) -> TodoReport {
    let needle = pattern.to_lowercase();
    let mut report = TodoReport::default();
    let mut scanned = 0usize;

    for path in walk_files(root, exclusions) {
        if !is_scannable(&path) {
            continue;
        }
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::debug!("Skipping {}: {}", path.display(), e);
                continue;
            }
        };
        scanned += 1;

        let text = String::from_utf8_lossy(&bytes);
        let matches: Vec<TodoMatch> = text
            .lines()
            .enumerate()
            .filter(|(_, line)| line.to_lowercase().contains(&needle))
            .map(|(idx, line)| TodoMatch {
                line: idx + 1,
                text: line.trim().to_string(),
            })
            .collect();

        if !matches.is_empty() {
            report.total += matches.len();
            report.files.insert(relative_display(root, &path), matches);
        }
    }

    report.file_count = report.files.len();
    tracing::debug!("Scanned {} file(s)", scanned);
    report
}
