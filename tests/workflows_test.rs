use anyhow::Result;
use base64::Engine;
use httpmock::prelude::*;
use repokit::app::commands::workflows::run_with;
use repokit::config::cli::WorkflowsCommand;
use repokit::core::workflows::{scan_dir, WorkflowAuditor};
use repokit::domain::model::Staleness;
use repokit::utils::colors::Palette;
use repokit::{AppContext, Gate, GitHubClient, KitConfig};
use serde_json::json;
use std::time::Duration;
use tempfile::TempDir;

const CHECKOUT_SHA: &str = "11bd71901bbe5b1630ceea73d27597364c9af683";
const TAG_OBJECT_SHA: &str = "9a9194f87191a7e9055e3e9b95b8cfb13023bb08";
const PYTHON_SHA: &str = "a26af69be951a213d495a4c3e4e4022e16d87065";

fn encoded(text: &str) -> String {
    base64::engine::general_purpose::STANDARD.encode(text)
}

/// Annotated v4.1.0 for checkout, a tag scan for setup-python, and metadata for both.
fn mock_github(server: &MockServer) {
    server.mock(|when, then| {
        when.method(GET)
            .path("/repos/actions/checkout/git/matching-refs/tags/v4.1.0");
        then.status(200).json_body(json!([
            {"ref": "refs/tags/v4.1.0", "object": {"sha": TAG_OBJECT_SHA, "type": "tag"}},
            {"ref": "refs/tags/v4.1.0-beta", "object": {"sha": "0000", "type": "commit"}}
        ]));
    });
    server.mock(|when, then| {
        when.method(GET)
            .path(format!("/repos/actions/checkout/git/tags/{}", TAG_OBJECT_SHA));
        then.status(200)
            .json_body(json!({"object": {"sha": CHECKOUT_SHA, "type": "commit"}}));
    });
    server.mock(|when, then| {
        when.method(GET)
            .path("/repos/actions/setup-python/tags")
            .query_param("per_page", "100")
            .query_param("page", "1");
        then.status(200).json_body(json!([
            {"name": "v5", "commit": {"sha": PYTHON_SHA}},
            {"name": "v5.3.0", "commit": {"sha": PYTHON_SHA}},
            {"name": "v5.2.0", "commit": {"sha": "ffff"}}
        ]));
    });
    server.mock(|when, then| {
        when.method(GET).path("/repos/actions/checkout/releases/latest");
        then.status(200).json_body(json!({"tag_name": "v4.2.2"}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/repos/actions/checkout/contents/action.yml");
        then.status(200).json_body(json!({
            "content": encoded("name: Checkout\ndescription: 'Checkout a Git repository at a particular version'\n")
        }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/repos/actions/setup-python/contents/action.yaml");
        then.status(200).json_body(json!({
            "content": encoded("name: Setup Python\ndescription: Set up Python\n")
        }));
    });
}

fn workflow_repo() -> Result<TempDir> {
    let dir = TempDir::new()?;
    let workflows = dir.path().join(".github/workflows");
    std::fs::create_dir_all(&workflows)?;
    std::fs::write(
        workflows.join("ci.yml"),
        format!(
            "jobs:\n  test:\n    steps:\n      - uses: actions/checkout@{} # v4.1.0\n      - uses: actions/setup-python@{}\n",
            CHECKOUT_SHA, PYTHON_SHA
        ),
    )?;
    Ok(dir)
}

fn client(server: &MockServer) -> GitHubClient {
    GitHubClient::new(&server.base_url(), None, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_rows_resolve_annotated_tags_and_scanned_tags() -> Result<()> {
    let server = MockServer::start();
    mock_github(&server);
    let repo = workflow_repo()?;
    let api = client(&server);

    let pins = scan_dir(&repo.path().join(".github/workflows"))?;
    let mut auditor = WorkflowAuditor::new(&api);
    let rows = auditor.build_rows(&pins, false).await;

    assert_eq!(rows.len(), 2);
    let checkout = &rows[0];
    assert_eq!(checkout.resolved_tag.as_deref(), Some("v4.1.0"));
    assert_eq!(checkout.latest_tag.as_deref(), Some("v4.2.2"));
    assert_eq!(checkout.stale, Staleness::NoDescription);
    assert!(checkout.upgradable);

    let python = &rows[1];
    assert_eq!(python.resolved_tag.as_deref(), Some("v5.3.0"));
    assert_eq!(python.stale, Staleness::Missing);
    assert!(python.latest_tag.is_none());
    assert!(!python.upgradable);
    Ok(())
}

#[tokio::test]
async fn test_update_comments_writes_descriptions() -> Result<()> {
    let server = MockServer::start();
    mock_github(&server);
    let repo = workflow_repo()?;
    let ctx = AppContext::new(repo.path().to_path_buf(), KitConfig::default(), Palette::plain());

    let gate = run_with(&ctx, &WorkflowsCommand::UpdateComments, &client(&server)).await?;
    assert_eq!(gate, Gate::Pass);

    let text = std::fs::read_to_string(repo.path().join(".github/workflows/ci.yml"))?;
    assert!(text.contains(&format!(
        "      - uses: actions/checkout@{} # Checkout a Git repository at a particular version (v4.1.0)\n",
        CHECKOUT_SHA
    )));
    assert!(text.contains(&format!(
        "      - uses: actions/setup-python@{} # Set up Python (v5.3.0)\n",
        PYTHON_SHA
    )));
    Ok(())
}

#[tokio::test]
async fn test_offline_show_makes_no_requests() -> Result<()> {
    let server = MockServer::start();
    let any = server.mock(|when, then| {
        when.method(GET);
        then.status(200).json_body(json!([]));
    });
    let repo = workflow_repo()?;
    let ctx = AppContext::new(repo.path().to_path_buf(), KitConfig::default(), Palette::plain());
    let command = WorkflowsCommand::Show(repokit::config::cli::ShowArgs {
        offline: true,
        ..Default::default()
    });

    let gate = run_with(&ctx, &command, &client(&server)).await?;
    assert_eq!(gate, Gate::Pass);
    assert_eq!(any.hits(), 0);
    Ok(())
}
