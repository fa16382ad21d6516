use crate::domain::model::{ActionRow, Staleness};
use crate::utils::error::Result;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

fn uses_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(?P<indent>\s*)-?\s*uses:\s*(?P<action>[A-Za-z0-9._-]+/[A-Za-z0-9._-]+(?:/[A-Za-z0-9._-]+)*)@(?P<sha>[0-9a-fA-F]{40})(?P<trail>.*)$",
        )
        .expect("static regex")
    })
}

fn paren_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\((v?\d+\.\d+[.\d]*)\)").expect("static regex"))
}

fn bare_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"#\s*(v?\S+)").expect("static regex"))
}

/// A `uses: owner/repo@<sha>` line split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinLine {
    pub indent: String,
    pub list_item: bool,
    pub action: String,
    pub sha: String,
    pub trail: String,
}

impl PinLine {
    pub fn parse(line: &str) -> Option<Self> {
        let caps = uses_regex().captures(line)?;
        Some(Self {
            indent: caps["indent"].to_string(),
            list_item: line.trim_start().starts_with('-'),
            action: caps["action"].to_string(),
            sha: caps["sha"].to_string(),
            trail: caps["trail"].to_string(),
        })
    }

    /// Reassembles the line with a new SHA and trailing text.
    pub fn render(&self, sha: &str, trail: &str) -> String {
        format!(
            "{}{}uses: {}@{}{}",
            self.indent,
            if self.list_item { "- " } else { "" },
            self.action,
            sha,
            trail
        )
    }
}

/// Tag and description markers found in a pin's trailing comment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentInfo {
    pub tag: Option<String>,
    pub has_description: bool,
}

pub fn parse_comment(trail: &str) -> CommentInfo {
    let trail = trail.trim();
    if !trail.contains('#') {
        return CommentInfo::default();
    }
    if let Some(caps) = paren_tag_regex().captures(trail) {
        return CommentInfo {
            tag: Some(caps[1].to_string()),
            has_description: true,
        };
    }
    CommentInfo {
        tag: bare_tag_regex().captures(trail).map(|c| c[1].to_string()),
        has_description: false,
    }
}

/// `owner/repo` of an action reference, dropping any sub-path.
pub fn repo_slug(action: &str) -> String {
    action.splitn(3, '/').take(2).collect::<Vec<_>>().join("/")
}

/// `v1.2.3-beta` -> `[1, 2, 3]`; short versions are zero-padded.
pub fn normalize_version(version: &str) -> Vec<u64> {
    let version = version.strip_prefix('v').unwrap_or(version);
    let mut parts: Vec<u64> = version
        .split('.')
        .map(|p| p.split('-').next().unwrap_or("").parse().unwrap_or(0))
        .collect();
    while parts.len() < 3 {
        parts.push(0);
    }
    parts
}

pub fn versions_equal(a: &str, b: &str) -> bool {
    normalize_version(a) == normalize_version(b)
}

/// A pin as it appears on disk, before any API lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinnedAction {
    pub file: String,
    pub line: usize,
    pub action: String,
    pub sha: String,
    pub comment: CommentInfo,
}

/// `*.yml` and `*.yaml` files directly in `dir`, sorted by name.
pub fn workflow_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e == "yml" || e == "yaml");
        if is_yaml && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

pub fn scan_text(file: &str, text: &str) -> Vec<PinnedAction> {
    text.lines()
        .enumerate()
        .filter_map(|(idx, line)| {
            let pin = PinLine::parse(line)?;
            Some(PinnedAction {
                file: file.to_string(),
                line: idx + 1,
                comment: parse_comment(&pin.trail),
                action: pin.action,
                sha: pin.sha,
            })
        })
        .collect()
}

pub fn scan_dir(dir: &Path) -> Result<Vec<PinnedAction>> {
    let mut pins = Vec::new();
    for path in workflow_files(dir)? {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let text = std::fs::read_to_string(&path)?;
        pins.extend(scan_text(&name, &text));
    }
    tracing::debug!("Found {} pinned action(s) in {}", pins.len(), dir.display());
    Ok(pins)
}

/// Combines a scanned pin with its lookups into a report row.
pub fn classify(pin: &PinnedAction, resolved: Option<String>, latest: Option<String>) -> ActionRow {
    let comment_tag = pin.comment.tag.clone();
    let has_description = pin.comment.has_description;

    let stale = match (&comment_tag, &resolved) {
        (Some(c), Some(r)) if !versions_equal(c, r) => Staleness::Stale,
        (None, Some(_)) => Staleness::Missing,
        (c, r) if !has_description && (c.is_some() || r.is_some()) => Staleness::NoDescription,
        _ => Staleness::Current,
    };

    let current = resolved.as_deref().or(comment_tag.as_deref());
    let upgradable = matches!((current, latest.as_deref()), (Some(c), Some(l)) if !versions_equal(c, l));

    ActionRow {
        file: pin.file.clone(),
        line: pin.line,
        action: pin.action.clone(),
        sha: pin.sha.clone(),
        comment_tag,
        resolved_tag: resolved,
        latest_tag: latest,
        stale,
        upgradable,
        has_description,
    }
}
