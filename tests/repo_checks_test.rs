use anyhow::Result;
use repokit::core::clean::{clean, CleanOptions};
use repokit::core::repo_doctor::{
    evaluate, load_profile_rules, load_rules_file, render_report, FormatOptions, RuleFilter,
};
use repokit::core::todos::{default_exclusions, find_todos};
use repokit::domain::model::Level;
use std::collections::BTreeSet;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, rel: &str, content: &str) -> Result<()> {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
}

const RULES: &str = r#"
[doctor]
ignore_missing = ["docs/adr"]
profiles = ["python"]

[[rule]]
type = "exists"
path = "README.md"
category = "docs"
impact = "Visitors cannot tell what the project is"
hint = "Add a README"
link = "https://example.com/readme"

[[rule]]
type = "exists"
path = "docs/adr"
kind = "dir"

[[rule]]
type = "exists"
path = ".github/workflows"
kind = "dir"
level = "info"
category = "ci"

[[rule]]
type = "regex_present"
path = "LICENSE"
regex = "MIT License"
"#;

const PYTHON_PROFILE: &str = r#"
[[rule]]
type = "toml_has_path"
path = "pyproject.toml"
toml_path = "tool.ruff"
category = "lint"
fix = "repokit doctor --fix"
"#;

#[test]
fn test_doctor_rules_profiles_and_filters() -> Result<()> {
    let dir = TempDir::new()?;
    let root = dir.path();
    write(root, ".repo-doctor.toml", RULES)?;
    write(root, "repo_doctor.d/python.toml", PYTHON_PROFILE)?;
    write(root, "LICENSE", "Apache License 2.0\n")?;
    write(root, "pyproject.toml", "[project]\nname = \"demo\"\n")?;

    let (mut rules, settings) = load_rules_file(&root.join(".repo-doctor.toml"));
    rules.extend(load_profile_rules(&root.join("repo_doctor.d"), &settings.profiles));
    assert_eq!(rules.len(), 5);

    let rules = RuleFilter {
        min_level: Level::Warn,
        category: None,
        ignore_missing: settings.ignore_missing,
    }
    .apply(rules);
    assert_eq!(rules.len(), 3);

    let findings = evaluate(root, &rules, true, &BTreeSet::new());
    let messages: Vec<&str> = findings.iter().map(|f| f.message.as_str()).collect();
    assert_eq!(
        messages,
        vec![
            "Missing: README.md",
            "Check failed: expected pattern in LICENSE",
            "Check failed: [tool.ruff] missing in pyproject.toml",
        ]
    );

    let report = render_report(&findings, FormatOptions { hints: false, links: true, fix: true });
    assert!(report.starts_with("Repo doctor warnings (non-blocking):"));
    assert!(report.contains("[warn] (docs) Missing: README.md\n  Impact: Visitors cannot tell what the project is\n  See:    https://example.com/readme"));
    assert!(!report.contains("Hint:"));
    assert!(report.contains("  Fix:    repokit doctor --fix"));
    Ok(())
}

#[test]
fn test_doctor_staged_deletion_of_directory_rule() -> Result<()> {
    let dir = TempDir::new()?;
    let root = dir.path();
    write(root, ".repo-doctor.toml", RULES)?;
    write(root, "README.md", "# demo\n")?;

    let (rules, _) = load_rules_file(&root.join(".repo-doctor.toml"));
    let deleted: BTreeSet<String> = [".github/workflows/ci.yml".to_string()].into();
    let findings = evaluate(root, &rules, false, &deleted);

    let messages: Vec<&str> = findings.iter().map(|f| f.message.as_str()).collect();
    assert_eq!(messages, vec!["Deleted: .github/workflows"]);
    Ok(())
}

#[test]
fn test_todos_skip_excluded_trees() -> Result<()> {
    let dir = TempDir::new()?;
    let root = dir.path();
    write(root, "src/main.rs", "// TODO (template users): rename the binary\nfn main() {}\n")?;
    write(root, "Containerfile", "# todo (TEMPLATE USERS): pick a base image\n")?;
    write(root, "target/debug/build.rs", "// TODO (template users): ignored\n")?;
    write(root, "pkg.egg-info/PKG-INFO.txt", "TODO (template users): ignored\n")?;
    write(root, "notes/scratch.md", "TODO (template users): excluded by prefix\n")?;
    write(root, "image.png", "TODO (template users): wrong extension\n")?;

    let report = find_todos(root, "TODO (template users)", &default_exclusions(["notes"]));
    assert_eq!(report.total, 2);
    let files: Vec<&str> = report.files.keys().map(String::as_str).collect();
    assert_eq!(files, vec!["Containerfile", "src/main.rs"]);
    assert_eq!(report.files["src/main.rs"][0].line, 1);
    Ok(())
}

#[test]
fn test_clean_dry_run_then_remove() -> Result<()> {
    let dir = TempDir::new()?;
    let root = dir.path();
    write(root, ".pytest_cache/v/cache", "x")?;
    write(root, "build/lib/demo.py", "x")?;
    write(root, "src/demo/__pycache__/mod.cpython-312.pyc", "x")?;
    write(root, "src/demo/stale.pyc", "x")?;
    write(root, ".venv/lib/site/__pycache__/x.pyc", "x")?;
    write(root, "src/demo/mod.py", "x")?;

    let dry = clean(root, CleanOptions { dry_run: true, include_venv: false })?;
    assert_eq!(dry.len(), 4);
    assert!(root.join("build").exists());

    let removed = clean(root, CleanOptions { dry_run: false, include_venv: false })?;
    assert_eq!(removed.len(), 4);
    assert!(!root.join(".pytest_cache").exists());
    assert!(!root.join("src/demo/stale.pyc").exists());
    assert!(root.join("src/demo/mod.py").exists());
    assert!(root.join(".venv/lib/site/__pycache__/x.pyc").exists());
    Ok(())
}
