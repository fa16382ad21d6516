use crate::app::{AppContext, Gate};
use crate::config::cli::TodosArgs;
use crate::core::todos::{default_exclusions, find_todos, TodoReport};
use crate::utils::error::Result;
use crate::utils::validation::validate_non_empty_string;

pub fn scan(ctx: &AppContext, args: &TodosArgs) -> Result<TodoReport> {
    let pattern = args
        .pattern
        .clone()
        .unwrap_or_else(|| ctx.config.todos.pattern.clone());
    validate_non_empty_string("pattern", &pattern)?;

    let exclusions = default_exclusions(ctx.config.todos.exclude.iter().chain(args.exclude.iter()));
    tracing::debug!("Scanning {} for '{}'", ctx.root.display(), pattern);
    Ok(find_todos(&ctx.root, &pattern, &exclusions))
}

pub fn run(ctx: &AppContext, args: &TodosArgs) -> Result<Gate> {
    let report = scan(ctx, args)?;

    if !args.quiet {
        let output = if args.count {
            report.to_count_line()
        } else if args.json {
            report.to_json()?
        } else if args.csv {
            report.to_csv()?
        } else {
            report.to_text()
        };
        println!("{}", output.trim_end());
    }

    Ok(Gate::from_failures(!report.is_clean()))
}
