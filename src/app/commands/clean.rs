use crate::app::{AppContext, Gate};
use crate::config::cli::CleanArgs;
use crate::core::clean::{clean, render, CleanOptions};
use crate::utils::error::{KitError, Result};
use std::io::{BufRead, Write};

pub fn run(ctx: &AppContext, args: &CleanArgs) -> Result<Gate> {
    let stdin = std::io::stdin();
    run_with_input(ctx, args, &mut stdin.lock())
}

pub fn run_with_input(ctx: &AppContext, args: &CleanArgs, input: &mut dyn BufRead) -> Result<Gate> {
    if args.include_venv && !args.dry_run && !args.yes {
        print!("This will delete .venv* directories. Continue? [y/N] ");
        std::io::stdout().flush()?;
        let mut answer = String::new();
        input.read_line(&mut answer)?;
        if !answer.trim().eq_ignore_ascii_case("y") {
            return Err(KitError::Aborted);
        }
    }

    let options = CleanOptions {
        dry_run: args.dry_run,
        include_venv: args.include_venv,
    };
    let targets = clean(&ctx.root, options)?;
    println!("{}", render(&targets, options));
    Ok(Gate::Pass)
}
