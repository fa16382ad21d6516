// Application layer: one handler per subcommand, wired to the core modules.

pub mod commands;
pub mod context;

pub use context::AppContext;

use crate::config::cli::Command;
use crate::utils::error::Result;

/// Outcome of a check that ran to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Pass,
    Fail,
}

impl Gate {
    pub fn from_failures(failed: bool) -> Self {
        if failed {
            Gate::Fail
        } else {
            Gate::Pass
        }
    }

    pub fn exit_code(self) -> u8 {
        match self {
            Gate::Pass => 0,
            Gate::Fail => 1,
        }
    }
}

pub async fn run(ctx: &AppContext, command: &Command, verbose: bool) -> Result<Gate> {
    match command {
        Command::NulBytes(args) => Ok(commands::nul_bytes::run(args)),
        Command::Todos(args) => commands::todos::run(ctx, args),
        Command::ArchiveTodos(args) => commands::archive::run(ctx, args),
        Command::Changelog(args) => commands::changelog::run(ctx, args, verbose),
        Command::Workflows(args) => commands::workflows::run(ctx, args).await,
        Command::Doctor(args) => commands::doctor::run(ctx, args),
        Command::Clean(args) => commands::clean::run(ctx, args),
        Command::Diagnostics(args) => commands::diagnostics::run(ctx, args),
        Command::Labels(args) => commands::labels::run(ctx, args).await,
        Command::Links(args) => commands::links::run(ctx, args),
    }
}
