use crate::app::{AppContext, Gate};
use crate::config::cli::DiagnosticsArgs;
use crate::core::diagnostics::{collect, save};
use crate::utils::error::Result;

pub fn run(ctx: &AppContext, args: &DiagnosticsArgs) -> Result<Gate> {
    let report = collect(&ctx.root, &ctx.config.diagnostics.tools);
    let content = if args.markdown {
        report.to_markdown()
    } else if args.json {
        report.to_json()?
    } else {
        report.to_plain()
    };
    println!("{}", content);

    if let Some(output) = &args.output {
        save(output, &content)?;
        eprintln!("Saved to: {}", output.display());
    }
    Ok(Gate::Pass)
}
