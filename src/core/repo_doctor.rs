//! Warn-only repository structure checks.
//!
//! Rules live in `[[rule]]` tables of `.repo-doctor.toml` plus optional
//! profile files under `repo_doctor.d/`. Nothing here fails the caller; every
//! problem becomes a [`Finding`].

use crate::domain::model::Level;
use crate::utils::fs::{walk_files, Exclusions};
use regex::Regex;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use toml::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuleKind {
    #[default]
    File,
    Dir,
    Any,
}

impl RuleKind {
    fn parse(raw: &str) -> Self {
        match raw {
            "dir" => RuleKind::Dir,
            "any" => RuleKind::Any,
            _ => RuleKind::File,
        }
    }

    pub fn matches(self, path: &Path) -> bool {
        match self {
            RuleKind::File => path.is_file(),
            RuleKind::Dir => path.is_dir(),
            RuleKind::Any => path.exists(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnlyIf {
    pub path: String,
    pub regex: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Rule {
    /// `exists`, `regex_present` or `toml_has_path`.
    pub rule_type: String,
    pub path: String,
    pub kind: RuleKind,
    pub level: Level,
    pub category: String,
    pub impact: String,
    pub hint: String,
    pub link: String,
    pub fix: String,
    pub toml_path: String,
    pub regex: String,
    pub only_if: Option<OnlyIf>,
}

/// `[doctor]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DoctorSettings {
    pub ignore_missing: BTreeSet<String>,
    pub profiles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub rule: Rule,
    pub message: String,
}

fn str_field(table: &toml::Table, key: &str) -> String {
    match table.get(key) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) => other.to_string().trim().to_string(),
        None => String::new(),
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn parse_level(raw: &str) -> Level {
    match raw {
        "warn" | "" => Level::Warn,
        "info" => Level::Info,
        other => {
            tracing::warn!("Unknown rule level '{}', treating as info", other);
            Level::Info
        }
    }
}

/// Rules from the `rule` array of a parsed document. Entries without a type or path are dropped.
pub fn parse_rules(doc: &toml::Table) -> Vec<Rule> {
    let Some(Value::Array(entries)) = doc.get("rule") else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(Value::as_table)
        .map(|entry| {
            let only_if = entry.get("only_if").and_then(Value::as_table).and_then(|oi| {
                let path = str_field(oi, "path");
                let regex = str_field(oi, "regex");
                (!path.is_empty() && !regex.is_empty()).then_some(OnlyIf { path, regex })
            });
            Rule {
                rule_type: str_field(entry, "type"),
                path: str_field(entry, "path"),
                kind: RuleKind::parse(&str_field(entry, "kind")),
                level: parse_level(&str_field(entry, "level")),
                category: str_field(entry, "category"),
                impact: str_field(entry, "impact"),
                hint: str_field(entry, "hint"),
                link: str_field(entry, "link"),
                fix: str_field(entry, "fix"),
                toml_path: str_field(entry, "toml_path"),
                regex: str_field(entry, "regex"),
                only_if,
            }
        })
        .filter(|r| !r.rule_type.is_empty() && !r.path.is_empty())
        .collect()
}

pub fn parse_settings(doc: &toml::Table) -> DoctorSettings {
    let Some(doctor) = doc.get("doctor").and_then(Value::as_table) else {
        return DoctorSettings::default();
    };
    DoctorSettings {
        ignore_missing: string_list(doctor.get("ignore_missing")).into_iter().collect(),
        profiles: string_list(doctor.get("profiles")),
    }
}

fn read_table(path: &Path) -> Option<toml::Table> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!("Could not read {}: {}", path.display(), e);
            return None;
        }
    };
    match text.parse::<toml::Table>() {
        Ok(table) => Some(table),
        Err(e) => {
            tracing::warn!("Could not parse {}: {}", path.display(), e);
            None
        }
    }
}

/// Rules and settings from the main rules file. A missing or broken file yields nothing.
pub fn load_rules_file(path: &Path) -> (Vec<Rule>, DoctorSettings) {
    if !path.is_file() {
        tracing::debug!("No rules file at {}", path.display());
        return (Vec::new(), DoctorSettings::default());
    }
    match read_table(path) {
        Some(doc) => (parse_rules(&doc), parse_settings(&doc)),
        None => (Vec::new(), DoctorSettings::default()),
    }
}

/// Rules from `<dir>/<name>.toml` per profile; `all` loads every profile file.
pub fn load_profile_rules(profiles_dir: &Path, names: &[String]) -> Vec<Rule> {
    if !profiles_dir.is_dir() || names.is_empty() {
        return Vec::new();
    }

    let files: Vec<PathBuf> = if names.iter().any(|n| n == "all") {
        let mut all: Vec<PathBuf> = std::fs::read_dir(profiles_dir)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok().map(|e| e.path()))
                    .filter(|p| p.extension().is_some_and(|e| e == "toml"))
                    .collect()
            })
            .unwrap_or_default();
        all.sort();
        all
    } else {
        names
            .iter()
            .map(|n| profiles_dir.join(format!("{}.toml", n)))
            .filter(|p| {
                let found = p.is_file();
                if !found {
                    tracing::warn!("Profile not found: {}", p.display());
                }
                found
            })
            .collect()
    };

    files
        .iter()
        .filter_map(|f| read_table(f))
        .flat_map(|doc| parse_rules(&doc))
        .collect()
}

/// Display filters applied before evaluation.
#[derive(Debug, Clone, Default)]
pub struct RuleFilter {
    pub min_level: Level,
    pub category: Option<String>,
    pub ignore_missing: BTreeSet<String>,
}

impl RuleFilter {
    pub fn apply(&self, rules: Vec<Rule>) -> Vec<Rule> {
        rules
            .into_iter()
            .filter(|r| r.level >= self.min_level)
            .filter(|r| self.category.as_ref().map_or(true, |c| &r.category == c))
            .filter(|r| !self.ignore_missing.contains(&r.path))
            .collect()
    }
}

pub fn matches_deletion(rule_path: &str, kind: RuleKind, deleted: &str) -> bool {
    if kind != RuleKind::Dir {
        return deleted == rule_path;
    }
    let base = rule_path.trim_end_matches('/');
    deleted == base || deleted.starts_with(&format!("{}/", base))
}

fn any_file_matches(root: &Path, rel: &str, re: &Regex) -> bool {
    let base = root.join(rel);
    let files = if base.is_file() {
        vec![base]
    } else if base.is_dir() {
        walk_files(&base, &Exclusions::default())
    } else {
        Vec::new()
    };
    files.iter().any(|f| {
        std::fs::read(f)
            .map(|bytes| re.is_match(&String::from_utf8_lossy(&bytes)))
            .unwrap_or(false)
    })
}

enum TomlCheck {
    Present,
    Absent,
    ParseError(String),
}

fn toml_has_path(file: &Path, dotted: &str) -> TomlCheck {
    let text = match std::fs::read_to_string(file) {
        Ok(t) => t,
        Err(e) => return TomlCheck::ParseError(e.to_string()),
    };
    let doc = match text.parse::<toml::Table>() {
        Ok(doc) => doc,
        Err(e) => return TomlCheck::ParseError(e.message().to_string()),
    };

    let mut current = Value::Table(doc);
    for part in dotted.split('.') {
        match current {
            Value::Table(mut table) => match table.remove(part) {
                Some(next) => current = next,
                None => return TomlCheck::Absent,
            },
            _ => return TomlCheck::Absent,
        }
    }
    TomlCheck::Present
}

/// Runs every rule. Deletion findings come first, then per-rule checks in order.
pub fn evaluate(root: &Path, rules: &[Rule], check_missing: bool, deleted: &BTreeSet<String>) -> Vec<Finding> {
    let mut findings = Vec::new();
    let mut push = |rule: &Rule, message: String| {
        findings.push(Finding {
            rule: rule.clone(),
            message,
        })
    };

    for rule in rules {
        let kind = if rule.rule_type == "exists" {
            rule.kind
        } else {
            RuleKind::File
        };
        if deleted.iter().any(|d| matches_deletion(&rule.path, kind, d)) {
            push(rule, format!("Deleted: {}", rule.path));
        }
    }

    for rule in rules {
        if let Some(only_if) = &rule.only_if {
            match Regex::new(&only_if.regex) {
                Ok(re) if any_file_matches(root, &only_if.path, &re) => {}
                Ok(_) => continue,
                Err(e) => {
                    push(rule, format!("Invalid only_if pattern for '{}': {}", rule.path, e));
                    continue;
                }
            }
        }

        let target = root.join(&rule.path);
        match rule.rule_type.as_str() {
            "exists" => {
                if check_missing && !rule.kind.matches(&target) {
                    push(rule, format!("Missing: {}", rule.path));
                }
            }
            "regex_present" => {
                if !target.exists() {
                    if check_missing {
                        push(rule, format!("Missing: {}", rule.path));
                    }
                    continue;
                }
                if rule.regex.is_empty() {
                    continue;
                }
                match Regex::new(&rule.regex) {
                    Ok(re) if any_file_matches(root, &rule.path, &re) => {}
                    Ok(_) => push(rule, format!("Check failed: expected pattern in {}", rule.path)),
                    Err(e) => push(rule, format!("Invalid pattern for '{}': {}", rule.path, e)),
                }
            }
            "toml_has_path" => {
                if !target.is_file() {
                    continue;
                }
                match toml_has_path(&target, &rule.toml_path) {
                    TomlCheck::Present => {}
                    TomlCheck::Absent => push(
                        rule,
                        format!("Check failed: [{}] missing in {}", rule.toml_path, rule.path),
                    ),
                    TomlCheck::ParseError(note) => {
                        push(rule, format!("TOML parse issue in {}: {}", rule.path, note));
                        push(
                            rule,
                            format!("Check failed: [{}] missing in {}", rule.toml_path, rule.path),
                        );
                    }
                }
            }
            other => push(
                rule,
                format!("Unknown rule type '{}' for path '{}' (ignored)", other, rule.path),
            ),
        }
    }

    findings
}

#[derive(Debug, Clone, Copy)]
pub struct FormatOptions {
    pub hints: bool,
    pub links: bool,
    pub fix: bool,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            hints: true,
            links: true,
            fix: false,
        }
    }
}

pub fn format_finding(finding: &Finding, opts: FormatOptions) -> String {
    let rule = &finding.rule;
    let category = if rule.category.is_empty() {
        String::new()
    } else {
        format!(" ({})", rule.category)
    };

    let mut lines = vec![format!("[{}]{} {}", rule.level, category, finding.message)];
    if !rule.impact.is_empty() {
        lines.push(format!("  Impact: {}", rule.impact));
    }
    if opts.hints && !rule.hint.is_empty() {
        lines.push(format!("  Hint:   {}", rule.hint));
    }
    if opts.links && !rule.link.is_empty() {
        lines.push(format!("  See:    {}", rule.link));
    }
    if opts.fix && !rule.fix.is_empty() {
        lines.push(format!("  Fix:    {}", rule.fix));
    }
    lines.join("\n")
}

pub fn render_report(findings: &[Finding], opts: FormatOptions) -> String {
    if findings.is_empty() {
        return "Repo doctor: all checks passed.".to_string();
    }
    let mut out = String::from("Repo doctor warnings (non-blocking):\n\n");
    for finding in findings {
        out.push_str(&format_finding(finding, opts));
        out.push_str("\n\n");
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn parse(text: &str) -> toml::Table {
        text.parse().unwrap()
    }

    fn rule(rule_type: &str, path: &str) -> Rule {
        Rule {
            rule_type: rule_type.into(),
            path: path.into(),
            ..Rule::default()
        }
    }

    #[test]
    fn test_parse_rules_and_settings() {
        let doc = parse(
            r###"
[doctor]
ignore_missing = ["docs/optional.md"]
profiles = ["python"]

[[rule]]
type = "exists"
path = ".github/workflows"
kind = "dir"
level = "info"
category = "ci"
hint = "Add CI"

[[rule]]
type = "regex_present"
path = "README.md"
regex = "## Install"
only_if = { path = "pyproject.toml", regex = "hatch" }

[[rule]]
path = "no-type"
"###,
        );
        let rules = parse_rules(&doc);
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].kind, RuleKind::Dir);
        assert_eq!(rules[0].level, Level::Info);
        assert_eq!(rules[1].level, Level::Warn);
        assert_eq!(rules[1].only_if.as_ref().unwrap().regex, "hatch");

        let settings = parse_settings(&doc);
        assert!(settings.ignore_missing.contains("docs/optional.md"));
        assert_eq!(settings.profiles, vec!["python"]);
    }

    #[test]
    fn test_matches_deletion() {
        assert!(matches_deletion("docs", RuleKind::Dir, "docs/index.md"));
        assert!(matches_deletion("docs/", RuleKind::Dir, "docs"));
        assert!(!matches_deletion("docs", RuleKind::Dir, "docs-old/x.md"));
        assert!(matches_deletion("README.md", RuleKind::File, "README.md"));
        assert!(!matches_deletion("docs", RuleKind::File, "docs/index.md"));
    }

    #[test]
    fn test_evaluate_exists_and_deletions() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("README.md"), "# Hi").unwrap();
        let mut docs = rule("exists", "docs");
        docs.kind = RuleKind::Dir;
        let rules = vec![rule("exists", "README.md"), docs, rule("exists", "LICENSE")];
        let deleted: BTreeSet<String> = ["docs/index.md".to_string()].into();

        let findings = evaluate(dir.path(), &rules, true, &deleted);
        let messages: Vec<&str> = findings.iter().map(|f| f.message.as_str()).collect();
        assert_eq!(messages, vec!["Deleted: docs", "Missing: docs", "Missing: LICENSE"]);

        let findings = evaluate(dir.path(), &rules, false, &BTreeSet::new());
        assert!(findings.is_empty());
    }

    #[test]
    fn test_evaluate_regex_and_only_if() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".github/workflows")).unwrap();
        std::fs::write(dir.path().join(".github/workflows/ci.yml"), "on: push\n").unwrap();
        std::fs::write(dir.path().join("Cargo.toml"), "[package]\nname = \"x\"\n").unwrap();

        let mut needs_ci = rule("regex_present", ".github/workflows");
        needs_ci.regex = "cargo test".into();
        let mut gated = rule("exists", "pyproject.toml");
        gated.only_if = Some(OnlyIf {
            path: "Cargo.toml".into(),
            regex: "pyo3".into(),
        });

        let findings = evaluate(dir.path(), &[needs_ci, gated], true, &BTreeSet::new());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].message, "Check failed: expected pattern in .github/workflows");
    }

    #[test]
    fn test_evaluate_toml_has_path() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Cargo.toml"), "[package]\nname = \"x\"\n").unwrap();
        std::fs::write(dir.path().join("broken.toml"), "[package\n").unwrap();

        let mut present = rule("toml_has_path", "Cargo.toml");
        present.toml_path = "package.name".into();
        let mut absent = rule("toml_has_path", "Cargo.toml");
        absent.toml_path = "lints.rust".into();
        let mut broken = rule("toml_has_path", "broken.toml");
        broken.toml_path = "package".into();
        let mut missing_file = rule("toml_has_path", "nope.toml");
        missing_file.toml_path = "x".into();

        let findings = evaluate(
            dir.path(),
            &[present, absent, broken, missing_file, rule("bogus", "x")],
            true,
            &BTreeSet::new(),
        );
        let messages: Vec<&str> = findings.iter().map(|f| f.message.as_str()).collect();
        assert_eq!(messages[0], "Check failed: [lints.rust] missing in Cargo.toml");
        assert!(messages[1].starts_with("TOML parse issue in broken.toml: "));
        assert_eq!(messages[2], "Check failed: [package] missing in broken.toml");
        assert_eq!(messages[3], "Unknown rule type 'bogus' for path 'x' (ignored)");
        assert_eq!(messages.len(), 4);
    }

    #[test]
    fn test_filters() {
        let mut info = rule("exists", "a");
        info.level = Level::Info;
        let mut ci = rule("exists", "b");
        ci.category = "ci".into();
        let ignored = rule("exists", "c");

        let filter = RuleFilter {
            min_level: Level::Warn,
            category: None,
            ignore_missing: ["c".to_string()].into(),
        };
        let kept = filter.apply(vec![info.clone(), ci.clone(), ignored]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].path, "b");

        let filter = RuleFilter {
            min_level: Level::Info,
            category: Some("ci".into()),
            ..RuleFilter::default()
        };
        assert_eq!(filter.apply(vec![info, ci]).len(), 1);
    }

    #[test]
    fn test_profiles() {
        let dir = TempDir::new().unwrap();
        let profiles = dir.path().join("repo_doctor.d");
        std::fs::create_dir_all(&profiles).unwrap();
        std::fs::write(profiles.join("a.toml"), "[[rule]]\ntype = \"exists\"\npath = \"A\"\n").unwrap();
        std::fs::write(profiles.join("b.toml"), "[[rule]]\ntype = \"exists\"\npath = \"B\"\n").unwrap();
        std::fs::write(profiles.join("bad.toml"), "[[rule\n").unwrap();

        let one = load_profile_rules(&profiles, &["b".to_string(), "missing".to_string()]);
        assert_eq!(one.iter().map(|r| r.path.as_str()).collect::<Vec<_>>(), vec!["B"]);

        let all = load_profile_rules(&profiles, &["all".to_string()]);
        assert_eq!(all.iter().map(|r| r.path.as_str()).collect::<Vec<_>>(), vec!["A", "B"]);
    }

    #[test]
    fn test_format_finding() {
        let mut r = rule("exists", "LICENSE");
        r.category = "legal".into();
        r.impact = "Unclear licensing".into();
        r.hint = "Add a LICENSE file".into();
        r.link = "docs/adr/001.md".into();
        r.fix = "touch LICENSE".into();
        let finding = Finding {
            rule: r,
            message: "Missing: LICENSE".into(),
        };

        let text = format_finding(&finding, FormatOptions::default());
        assert_eq!(
            text,
            "[warn] (legal) Missing: LICENSE\n  Impact: Unclear licensing\n  Hint:   Add a LICENSE file\n  See:    docs/adr/001.md"
        );
        let all = format_finding(&finding, FormatOptions { hints: false, links: false, fix: true });
        assert!(all.ends_with("  Fix:    touch LICENSE"));
        assert!(!all.contains("Hint:"));

        assert_eq!(render_report(&[], FormatOptions::default()), "Repo doctor: all checks passed.");
    }
}
