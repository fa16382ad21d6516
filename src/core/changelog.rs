use crate::domain::ports::GitClient;
use crate::utils::error::Result;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::OnceLock;

fn heading_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^##\s+\[?(\d+\.\d+\.\d+[A-Za-z0-9.+-]*)\]?").expect("static regex")
    })
}

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^v(\d+\.\d+\.\d+[A-Za-z0-9.+-]*)$").expect("static regex"))
}

/// Versions from release headings, in file order.
pub fn changelog_versions(text: &str) -> Vec<String> {
    heading_regex()
        .captures_iter(text)
        .map(|c| c[1].to_string())
        .collect()
}

/// Versions of `v*` tags, `v` stripped, sorted. Git failures give an empty list.
pub fn tag_versions(git: &dyn GitClient, root: &Path) -> Vec<String> {
    let tags = match git.tags(root, "v*") {
        Ok(tags) => tags,
        Err(e) => {
            tracing::warn!("Could not list git tags: {}", e);
            return Vec::new();
        }
    };
    let mut versions: Vec<String> = tags
        .iter()
        .filter_map(|t| tag_regex().captures(t.trim()).map(|c| c[1].to_string()))
        .collect();
    sort_versions(&mut versions);
    versions
}

/// Leading integer of each dot-separated part, 0 when a part has none.
pub fn version_key(version: &str) -> Vec<u64> {
    version
        .split('.')
        .map(|part| {
            let digits: String = part.chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse().unwrap_or(0)
        })
        .collect()
}

fn sort_versions(versions: &mut [String]) {
    versions.sort_by(|a, b| version_key(a).cmp(&version_key(b)).then_with(|| a.cmp(b)));
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriftReport {
    pub changelog_count: usize,
    pub tag_count: usize,
    pub in_sync: Vec<String>,
    pub changelog_only: Vec<String>,
    pub tags_only: Vec<String>,
}

impl DriftReport {
    pub fn compare(changelog: &[String], tags: &[String]) -> Self {
        let changelog_set: BTreeSet<&String> = changelog.iter().collect();
        let tag_set: BTreeSet<&String> = tags.iter().collect();

        let collect = |it: &mut dyn Iterator<Item = &&String>| {
            let mut v: Vec<String> = it.map(|s| s.to_string()).collect();
            sort_versions(&mut v);
            v
        };

        Self {
            changelog_count: changelog.len(),
            tag_count: tags.len(),
            in_sync: collect(&mut changelog_set.intersection(&tag_set)),
            changelog_only: collect(&mut changelog_set.difference(&tag_set)),
            tags_only: collect(&mut tag_set.difference(&changelog_set)),
        }
    }

    pub fn has_drift(&self) -> bool {
        !self.changelog_only.is_empty() || !self.tags_only.is_empty()
    }

    pub fn render(&self, show_in_sync: bool) -> String {
        let mut out = vec![
            "CHANGELOG vs Git Tags".to_string(),
            "=".repeat(50),
            format!("  CHANGELOG versions: {}", self.changelog_count),
            format!("  Git tag versions:   {}", self.tag_count),
            format!("  In sync:            {}", self.in_sync.len()),
        ];

        let mut section = |title: &str, versions: &[String]| {
            out.push(format!("\n  {} ({}):", title, versions.len()));
            out.extend(versions.iter().map(|v| format!("    - {}", v)));
        };
        if !self.changelog_only.is_empty() {
            section("In CHANGELOG but not tagged", &self.changelog_only);
        }
        if !self.tags_only.is_empty() {
            section("Tagged but not in CHANGELOG", &self.tags_only);
        }
        if show_in_sync && !self.in_sync.is_empty() {
            section("In sync", &self.in_sync);
        }

        out.push(if self.has_drift() {
            "\nDrift detected between CHANGELOG.md and git tags.".to_string()
        } else {
            "\nAll versions are in sync.".to_string()
        });
        out.join("\n")
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
