use clap::Parser;
use repokit::utils::{logger, validation::Validate};
use repokit::{app, AppContext, CliConfig, KitError};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = CliConfig::parse();

    // stderr only; stdout carries reports
    logger::init_from_env(cli.verbose);

    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let ctx = match AppContext::from_cli(&cli) {
        Ok(ctx) => ctx,
        Err(e) => return fail(&e),
    };

    if let Err(e) = ctx.config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        return fail(&e);
    }

    match app::run(&ctx, &cli.command, cli.verbose).await {
        Ok(gate) => ExitCode::from(gate.exit_code()),
        Err(e) => {
            tracing::debug!(
                "Command failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            fail(&e)
        }
    }
}

fn fail(e: &KitError) -> ExitCode {
    eprintln!("❌ {}", e.user_friendly_message());
    if !matches!(e, KitError::Aborted) {
        eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
    }
    ExitCode::from(e.exit_code())
}
