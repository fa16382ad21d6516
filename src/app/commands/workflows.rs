use crate::adapters::GitHubClient;
use crate::app::{AppContext, Gate};
use crate::config::cli::{ShowArgs, UpgradeArgs, WorkflowsArgs, WorkflowsCommand};
use crate::core::workflows::{
    filter_rows, needs_attention, render_summary, render_table, repo_slug, rows_needing_comments,
    scan_dir, unique_by_slug, update_comments, upgrade_action, PinnedAction, WorkflowAuditor,
};
use crate::domain::model::ActionRow;
use crate::domain::ports::GitHubApi;
use crate::utils::error::Result;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

pub async fn run(ctx: &AppContext, args: &WorkflowsArgs) -> Result<Gate> {
    let command = args
        .command
        .clone()
        .unwrap_or_else(|| WorkflowsCommand::Show(ShowArgs::default()));
    let api = GitHubClient::from_config(&ctx.config)?;
    run_with(ctx, &command, &api).await
}

pub async fn run_with<A: GitHubApi + ?Sized>(
    ctx: &AppContext,
    command: &WorkflowsCommand,
    api: &A,
) -> Result<Gate> {
    let dir = ctx.path(&ctx.config.paths.workflows_dir);
    if !dir.is_dir() {
        eprintln!("No workflows directory at {}", ctx.relative(&dir).display());
        return Ok(Gate::Fail);
    }

    let quiet = matches!(command, WorkflowsCommand::Show(show) if show.quiet);
    if !quiet {
        eprintln!(
            "Workflow action versions for {}",
            ctx.palette.bold(&ctx.root_name())
        );
    }

    let pins = scan_dir(&dir)?;
    if pins.is_empty() {
        match command {
            WorkflowsCommand::Show(show) if show.json && !show.quiet => println!("[]"),
            _ if !quiet => println!("No SHA-pinned actions found."),
            _ => {}
        }
        return Ok(Gate::Pass);
    }

    let mut auditor = WorkflowAuditor::new(api);
    match command {
        WorkflowsCommand::Show(show) => show_rows(ctx, show, &pins, &mut auditor).await,
        WorkflowsCommand::UpdateComments => refresh_comments(&dir, &pins, &mut auditor).await,
        WorkflowsCommand::Upgrade(upgrade) => {
            upgrade_pins(ctx, &dir, upgrade, &pins, &mut auditor).await
        }
    }
}

async fn show_rows<A: GitHubApi + ?Sized>(
    ctx: &AppContext,
    args: &ShowArgs,
    pins: &[PinnedAction],
    auditor: &mut WorkflowAuditor<'_, A>,
) -> Result<Gate> {
    let rows = filter_rows(auditor.build_rows(pins, args.offline).await, args.filter);

    if args.quiet {
        return Ok(Gate::from_failures(needs_attention(&rows)));
    }
    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(Gate::Pass);
    }
    if rows.is_empty() {
        println!("No actions match the filter.");
        return Ok(Gate::Pass);
    }

    println!("{}", render_table(&rows, &ctx.palette));
    println!("{}", render_summary(&rows, &ctx.palette));
    Ok(Gate::Pass)
}

async fn refresh_comments<A: GitHubApi + ?Sized>(
    dir: &Path,
    pins: &[PinnedAction],
    auditor: &mut WorkflowAuditor<'_, A>,
) -> Result<Gate> {
    let rows = auditor.build_rows(pins, false).await;
    let pending = rows_needing_comments(&rows);
    if pending.is_empty() {
        println!("All comments are up to date.");
        return Ok(Gate::Pass);
    }

    let lacking: BTreeSet<&str> = pending
        .iter()
        .filter(|r| !r.has_description)
        .map(|r| r.action.as_str())
        .collect();
    if !lacking.is_empty() {
        eprintln!("Fetching descriptions for {} action(s) …", lacking.len());
    }
    let mut descriptions = HashMap::new();
    for action in lacking {
        let description = auditor.action_description(action).await;
        descriptions.insert(action.to_string(), description);
    }

    let changed = update_comments(dir, &rows, &descriptions)?;
    println!("Updated {} comment(s).", changed);
    Ok(Gate::Pass)
}

/// `(slug, target tag)` pairs to upgrade.
async fn upgrade_targets<A: GitHubApi + ?Sized>(
    args: &UpgradeArgs,
    rows: &[ActionRow],
    auditor: &mut WorkflowAuditor<'_, A>,
) -> Option<Vec<(String, String)>> {
    let Some(action) = &args.action else {
        return Some(
            unique_by_slug(rows.iter().filter(|r| r.upgradable))
                .into_iter()
                .filter_map(|r| Some((repo_slug(&r.action), r.latest_tag.clone()?)))
                .collect(),
        );
    };

    let slug = repo_slug(action);
    if !rows.iter().any(|r| repo_slug(&r.action) == slug) {
        eprintln!("{} is not used in any workflow", slug);
        return None;
    }
    let tag = match &args.tag {
        Some(tag) => tag.clone(),
        None => match auditor.latest_tag(&slug).await {
            Some(tag) => tag,
            None => {
                eprintln!("Could not determine the latest release of {}", slug);
                return None;
            }
        },
    };
    Some(vec![(slug, tag)])
}

async fn upgrade_pins<A: GitHubApi + ?Sized>(
    ctx: &AppContext,
    dir: &Path,
    args: &UpgradeArgs,
    pins: &[PinnedAction],
    auditor: &mut WorkflowAuditor<'_, A>,
) -> Result<Gate> {
    let rows = auditor.build_rows(pins, false).await;
    let Some(targets) = upgrade_targets(args, &rows, auditor).await else {
        return Ok(Gate::Fail);
    };
    if targets.is_empty() {
        println!("All actions are at their latest release.");
        return Ok(Gate::Pass);
    }

    let mut failed = false;
    let mut lines = 0;
    let mut files = BTreeSet::new();
    for (slug, tag) in &targets {
        let Some(sha) = auditor.resolve_sha_for_tag(slug, tag).await else {
            eprintln!("Could not resolve {}@{} to a commit", slug, tag);
            failed = true;
            continue;
        };

        let matching: Vec<&ActionRow> = rows.iter().filter(|r| repo_slug(&r.action) == *slug).collect();
        let current = matching
            .iter()
            .find_map(|r| r.current_tag())
            .unwrap_or("?");
        println!("{}: {} -> {}", slug, current, ctx.palette.green(tag));

        lines += upgrade_action(dir, &rows, slug, &sha, tag, args.dry_run)?;
        files.extend(matching.iter().map(|r| r.file.as_str()));
    }

    let verb = if args.dry_run { "Would update" } else { "Updated" };
    println!("{} {} line(s) in {} file(s).", verb, lines, files.len());
    Ok(Gate::from_failures(failed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KitConfig;
    use crate::domain::model::RowFilter;
    use crate::utils::colors::Palette;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    const OLD: &str = "1111111111111111111111111111111111111111";
    const NEW: &str = "2222222222222222222222222222222222222222";

    struct Api(HashMap<String, Value>);

    #[async_trait]
    impl GitHubApi for Api {
        async fn get_json(&self, path: &str) -> Result<Option<Value>> {
            Ok(self.0.get(path).cloned())
        }
        async fn post_json(&self, _path: &str, _body: &Value) -> Result<Value> {
            Ok(Value::Null)
        }
        async fn patch_json(&self, _path: &str, _body: &Value) -> Result<Value> {
            Ok(Value::Null)
        }
    }

    fn checkout_api() -> Api {
        let mut map = HashMap::new();
        map.insert(
            "repos/actions/checkout/git/matching-refs/tags/v4.1.0".to_string(),
            json!([{"ref": "refs/tags/v4.1.0", "object": {"sha": OLD, "type": "commit"}}]),
        );
        map.insert(
            "repos/actions/checkout/releases/latest".to_string(),
            json!({"tag_name": "v5.0.0"}),
        );
        map.insert(
            "repos/actions/checkout/git/matching-refs/tags/v5.0.0".to_string(),
            json!([{"ref": "refs/tags/v5.0.0", "object": {"sha": NEW, "type": "commit"}}]),
        );
        Api(map)
    }

    fn setup() -> (TempDir, AppContext) {
        let dir = TempDir::new().unwrap();
        let workflows = dir.path().join(".github/workflows");
        std::fs::create_dir_all(&workflows).unwrap();
        std::fs::write(
            workflows.join("ci.yml"),
            format!("jobs:\n  build:\n    steps:\n      - uses: actions/checkout@{} # Checkout (v4.1.0)\n", OLD),
        )
        .unwrap();
        let ctx = AppContext::new(dir.path().to_path_buf(), KitConfig::default(), Palette::plain());
        (dir, ctx)
    }

    fn show(quiet: bool, filter: RowFilter) -> WorkflowsCommand {
        WorkflowsCommand::Show(ShowArgs {
            offline: false,
            json: false,
            filter,
            quiet,
        })
    }

    #[tokio::test]
    async fn test_quiet_show_flags_upgradable() {
        let (_dir, ctx) = setup();
        let gate = run_with(&ctx, &show(true, RowFilter::All), &checkout_api()).await.unwrap();
        assert_eq!(gate, Gate::Fail);
    }

    #[tokio::test]
    async fn test_missing_dir_fails() {
        let dir = TempDir::new().unwrap();
        let ctx = AppContext::new(dir.path().to_path_buf(), KitConfig::default(), Palette::plain());
        let gate = run_with(&ctx, &show(false, RowFilter::All), &checkout_api()).await.unwrap();
        assert_eq!(gate, Gate::Fail);
    }

    #[tokio::test]
    async fn test_upgrade_all_rewrites_sha() {
        let (dir, ctx) = setup();
        let command = WorkflowsCommand::Upgrade(UpgradeArgs {
            action: None,
            tag: None,
            dry_run: false,
        });
        let gate = run_with(&ctx, &command, &checkout_api()).await.unwrap();
        assert_eq!(gate, Gate::Pass);

        let text = std::fs::read_to_string(dir.path().join(".github/workflows/ci.yml")).unwrap();
        assert!(text.contains(&format!("actions/checkout@{} # Checkout (v5.0.0)", NEW)));
    }

    #[tokio::test]
    async fn test_upgrade_unknown_action_fails() {
        let (dir, ctx) = setup();
        let command = WorkflowsCommand::Upgrade(UpgradeArgs {
            action: Some("actions/cache".to_string()),
            tag: None,
            dry_run: false,
        });
        let gate = run_with(&ctx, &command, &checkout_api()).await.unwrap();
        assert_eq!(gate, Gate::Fail);

        let text = std::fs::read_to_string(dir.path().join(".github/workflows/ci.yml")).unwrap();
        assert!(text.contains(OLD));
    }
}
