use crate::app::{AppContext, Gate};
use crate::config::cli::ArchiveArgs;
use crate::core::archive::{archive_completed, ArchivePlan};
use crate::utils::error::Result;
use chrono::NaiveDate;

pub fn run(ctx: &AppContext, args: &ArchiveArgs) -> Result<Gate> {
    run_on(ctx, args, chrono::Local::now().date_naive())
}

pub fn run_on(ctx: &AppContext, args: &ArchiveArgs, date: NaiveDate) -> Result<Gate> {
    let todo_file = ctx.path(&ctx.config.paths.todo_file);
    let archive_file = ctx.path(&ctx.config.paths.archive_file);
    let plan = archive_completed(&todo_file, &archive_file, date, args.dry_run)?;
    println!("{}", summary(&plan, args.dry_run));
    Ok(Gate::Pass)
}

fn summary(plan: &ArchivePlan, dry_run: bool) -> String {
    if plan.is_empty() {
        return "No completed items found".to_string();
    }
    let head = if dry_run {
        format!("Would archive {} item(s) to {}:", plan.items.len(), plan.month)
    } else {
        format!("Archived {} completed item(s) to {}:", plan.items.len(), plan.month)
    };
    std::iter::once(head)
        .chain(plan.items.iter().map(|item| format!("  {}", item)))
        .collect::<Vec<_>>()
        .join("\n")
}
