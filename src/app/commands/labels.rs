use crate::adapters::GitHubClient;
use crate::app::{AppContext, Gate};
use crate::config::cli::LabelsArgs;
use crate::core::labels::{dry_run_line, load_label_set, resolve_repo, upsert_labels, UpsertSummary};
use crate::domain::model::Label;
use crate::domain::ports::GitHubApi;
use crate::utils::error::Result;

pub async fn run(ctx: &AppContext, args: &LabelsArgs) -> Result<Gate> {
    let labels = load_label_set(&ctx.path(&ctx.config.paths.labels_dir), &args.set)?;
    let repo = resolve_repo(args.repo.as_deref(), ctx.git.as_ref(), &ctx.root)?;

    if args.dry_run {
        for label in &labels {
            println!("{}", dry_run_line(label));
        }
        println!("{}", done_line(UpsertSummary::default(), &repo));
        return Ok(Gate::Pass);
    }

    let api = GitHubClient::from_config(&ctx.config)?;
    apply(&api, &repo, &labels).await
}

pub async fn apply<A: GitHubApi + ?Sized>(api: &A, repo: &str, labels: &[Label]) -> Result<Gate> {
    tracing::info!("Applying {} label(s) to {}", labels.len(), repo);
    let summary = upsert_labels(api, repo, labels).await?;
    println!("{}", done_line(summary, repo));
    Ok(Gate::Pass)
}

fn done_line(summary: UpsertSummary, repo: &str) -> String {
    format!(
        "Done. Created: {}, Updated: {}. Repo: {}",
        summary.created, summary.updated, repo
    )
}
