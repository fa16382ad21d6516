use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Directory filter applied by the tree walkers.
#[derive(Debug, Clone, Default)]
pub struct Exclusions {
    /// Exact path-component names (`.git`, `node_modules`).
    pub dirs: Vec<String>,
    /// Component name suffixes (`.egg-info`).
    pub suffixes: Vec<String>,
    /// Root-relative path prefixes.
    pub prefixes: Vec<PathBuf>,
}

impl Exclusions {
    pub fn new(dirs: &[&str], suffixes: &[&str]) -> Self {
        Self {
            dirs: dirs.iter().map(|d| d.to_string()).collect(),
            suffixes: suffixes.iter().map(|s| s.to_string()).collect(),
            prefixes: Vec::new(),
        }
    }

    pub fn with_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.prefixes.extend(
            prefixes
                .into_iter()
                .map(|p| PathBuf::from(p.as_ref().trim_end_matches('/')))
                .filter(|p| !p.as_os_str().is_empty()),
        );
        self
    }

    /// `rel` is relative to the walk root.
    pub fn is_excluded(&self, rel: &Path) -> bool {
        for component in rel.components() {
            if let Component::Normal(name) = component {
                let name = name.to_string_lossy();
                if self.dirs.iter().any(|d| *d == name) {
                    return true;
                }
                if self.suffixes.iter().any(|s| name.ends_with(s.as_str())) {
                    return true;
                }
            }
        }
        self.prefixes.iter().any(|p| rel.starts_with(p))
    }
}

/// Every regular file under `root`, sorted, skipping excluded subtrees.
pub fn walk_files(root: &Path, exclusions: &Exclusions) -> Vec<PathBuf> {
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
            rel.as_os_str().is_empty() || !exclusions.is_excluded(rel)
        });

    let mut files = Vec::new();
    for entry in walker {
        match entry {
            Ok(entry) if entry.file_type().is_file() => files.push(entry.into_path()),
            Ok(_) => {}
            Err(e) => tracing::debug!("Skipping unreadable entry: {}", e),
        }
    }
    files
}

/// `rel` rendered with forward slashes regardless of platform.
pub fn to_posix(rel: &Path) -> String {
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

pub fn relative_display(root: &Path, path: &Path) -> String {
    to_posix(path.strip_prefix(root).unwrap_or(path))
}
