use crate::app::{AppContext, Gate};
use crate::config::cli::ChangelogArgs;
use crate::core::changelog::{changelog_versions, tag_versions, DriftReport};
use crate::utils::error::Result;

pub fn compare(ctx: &AppContext) -> Result<Option<DriftReport>> {
    let path = ctx.path(&ctx.config.paths.changelog);
    if !path.is_file() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(&path)?;
    let changelog = changelog_versions(&text);
    let tags = tag_versions(ctx.git.as_ref(), &ctx.root);
    tracing::debug!("{} changelog version(s), {} tag(s)", changelog.len(), tags.len());
    Ok(Some(DriftReport::compare(&changelog, &tags)))
}

pub fn run(ctx: &AppContext, args: &ChangelogArgs, verbose: bool) -> Result<Gate> {
    let Some(report) = compare(ctx)? else {
        eprintln!("{} not found", ctx.config.paths.changelog);
        return Ok(Gate::Fail);
    };

    if args.json {
        println!("{}", report.to_json()?);
    } else {
        println!("{}", report.render(args.list_synced || verbose));
    }
    Ok(Gate::from_failures(report.has_drift()))
}
