use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

fn repokit(root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("repokit").unwrap();
    cmd.env_remove("RUST_LOG")
        .env_remove("GITHUB_TOKEN")
        .env_remove("GH_TOKEN")
        .env("NO_COLOR", "1")
        .arg("--root")
        .arg(root);
    cmd
}

#[test]
fn test_version_flag() {
    Command::cargo_bin("repokit")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_nul_bytes_exit_code() -> Result<()> {
    let dir = TempDir::new()?;
    let good = dir.path().join("good.txt");
    let bad = dir.path().join("bad.txt");
    std::fs::write(&good, "fine\n")?;
    std::fs::write(&bad, b"oops\0")?;

    repokit(dir.path()).arg("nul-bytes").arg(&good).assert().success();
    repokit(dir.path())
        .arg("nul-bytes")
        .arg(&good)
        .arg(&bad)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("ERROR: NUL byte detected in"));
    Ok(())
}

#[test]
fn test_todos_count_and_clean_tree() -> Result<()> {
    let dir = TempDir::new()?;
    repokit(dir.path())
        .arg("todos")
        .assert()
        .success()
        .stdout(predicate::str::contains("No TODOs found"));

    std::fs::write(dir.path().join("README.md"), "TODO (template users): describe\n")?;
    repokit(dir.path())
        .args(["todos", "--count"])
        .assert()
        .code(1)
        .stdout(predicate::str::diff("1 TODO(s) across 1 file(s)\n"));
    Ok(())
}

#[test]
fn test_todos_csv_output() -> Result<()> {
    let dir = TempDir::new()?;
    std::fs::write(dir.path().join("setup.cfg"), "x\n# TODO (template users): name, url\n")?;
    repokit(dir.path())
        .args(["todos", "--csv"])
        .assert()
        .code(1)
        .stdout(predicate::str::starts_with(
            "file,line,text\nsetup.cfg,2,\"# TODO (template users): name, url\"",
        ));
    Ok(())
}

#[test]
fn test_doctor_without_rules() -> Result<()> {
    let dir = TempDir::new()?;
    repokit(dir.path())
        .arg("doctor")
        .assert()
        .success()
        .stdout(predicate::str::contains("Repo doctor: no rules found"));
    Ok(())
}

#[test]
fn test_links_check_and_single_file() -> Result<()> {
    let dir = TempDir::new()?;
    std::fs::create_dir_all(dir.path().join("docs"))?;
    let page = dir.path().join("docs/index.md");
    std::fs::write(&page, "See [Taskfile](../Taskfile.yml) and `[x](../y)`.\n")?;

    repokit(dir.path())
        .args(["links", "--check", "--repo-url", "https://github.com/octo/hello"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("index.md: 1 link(s)"));

    repokit(dir.path())
        .args(["links", "--repo-url", "https://github.com/octo/hello/", "--branch", "dev"])
        .arg(&page)
        .assert()
        .success()
        .stdout(predicate::str::diff(
            "See [Taskfile](https://github.com/octo/hello/blob/dev/Taskfile.yml) and `[x](../y)`.\n",
        ));
    Ok(())
}

#[test]
fn test_invalid_config_exits_one() -> Result<()> {
    let dir = TempDir::new()?;
    std::fs::write(dir.path().join("repokit.toml"), "[github]\ntimeout_seconds = 0\n")?;
    repokit(dir.path())
        .arg("todos")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("github.timeout_seconds"));
    Ok(())
}

#[test]
fn test_clean_declined_prompt() -> Result<()> {
    let dir = TempDir::new()?;
    std::fs::create_dir_all(dir.path().join(".venv/bin"))?;
    repokit(dir.path())
        .args(["clean", "--include-venv"])
        .write_stdin("n\n")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Aborted."));
    assert!(dir.path().join(".venv").exists());
    Ok(())
}

#[test]
fn test_archive_missing_todo_file() -> Result<()> {
    let dir = TempDir::new()?;
    repokit(dir.path())
        .arg("archive-todos")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("docs/notes/todo.md does not exist"));
    Ok(())
}

#[test]
fn test_diagnostics_json_saved() -> Result<()> {
    let dir = TempDir::new()?;
    let out = dir.path().join("out/diag.json");
    let assert = repokit(dir.path())
        .args(["diagnostics", "--json", "-o"])
        .arg(&out)
        .assert()
        .success()
        .stderr(predicate::str::contains("Saved to:"));

    let stdout = String::from_utf8(assert.get_output().stdout.clone())?;
    let value: serde_json::Value = serde_json::from_str(&stdout)?;
    assert_eq!(value["package"]["repokit"], env!("CARGO_PKG_VERSION"));
    assert_eq!(value["paths"]["Cargo.toml"], "missing");
    assert_eq!(std::fs::read_to_string(out)?.trim(), stdout.trim());
    Ok(())
}

#[test]
fn test_workflows_json_without_pins_is_empty_array() -> Result<()> {
    let dir = TempDir::new()?;
    let workflows = dir.path().join(".github/workflows");
    std::fs::create_dir_all(&workflows)?;
    std::fs::write(
        workflows.join("ci.yml"),
        "jobs:\n  build:\n    steps:\n      - uses: actions/checkout@v4\n",
    )?;

    let assert = repokit(dir.path())
        .args(["workflows", "show", "--json"])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone())?;
    let value: serde_json::Value = serde_json::from_str(&stdout)?;
    assert_eq!(value, serde_json::json!([]));
    Ok(())
}
