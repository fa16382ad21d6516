use serde::{Deserialize, Serialize};

/// Comment state of a pinned action line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Staleness {
    #[default]
    #[serde(rename = "")]
    Current,
    /// Comment tag differs from the tag the SHA resolves to.
    #[serde(rename = "yes")]
    Stale,
    /// No comment tag, but the SHA resolves to one.
    #[serde(rename = "missing")]
    Missing,
    /// Version known, description absent.
    #[serde(rename = "no-desc")]
    NoDescription,
}

impl Staleness {
    pub fn needs_update(self) -> bool {
        !matches!(self, Staleness::Current)
    }

    pub fn flag(self) -> &'static str {
        match self {
            Staleness::Current => "",
            Staleness::Stale => "^",
            Staleness::Missing => "+",
            Staleness::NoDescription => "d",
        }
    }
}

/// One `uses: owner/repo@<sha>` line found in a workflow file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRow {
    pub file: String,
    pub line: usize,
    pub action: String,
    pub sha: String,
    pub comment_tag: Option<String>,
    pub resolved_tag: Option<String>,
    pub latest_tag: Option<String>,
    pub stale: Staleness,
    pub upgradable: bool,
    pub has_description: bool,
}

impl ActionRow {
    /// Resolved tag, else the tag from the comment.
    pub fn current_tag(&self) -> Option<&str> {
        self.resolved_tag.as_deref().or(self.comment_tag.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    pub color: String,
    #[serde(default)]
    pub description: String,
}

/// Where to look for deleted paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletionScope {
    Staged,
    Range(String),
}

/// Row subset for the workflows report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum RowFilter {
    #[default]
    All,
    /// Comment tag wrong or missing.
    Stale,
    Upgradable,
    NoDesc,
}

impl RowFilter {
    pub fn accepts(self, row: &ActionRow) -> bool {
        match self {
            RowFilter::All => true,
            RowFilter::Stale => matches!(row.stale, Staleness::Stale | Staleness::Missing),
            RowFilter::Upgradable => row.upgradable,
            RowFilter::NoDesc => row.stale == Staleness::NoDescription,
        }
    }
}

/// Severity of a repo doctor rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    #[default]
    Warn,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Info => "info",
            Level::Warn => "warn",
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
