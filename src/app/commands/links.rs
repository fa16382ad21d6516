use crate::app::{AppContext, Gate};
use crate::config::cli::LinksArgs;
use crate::core::labels::parse_github_remote;
use crate::core::links::LinkRewriter;
use crate::utils::error::{KitError, Result};
use crate::utils::fs::{relative_display, walk_files, Exclusions};
use crate::utils::validation::validate_url;
use std::path::{Path, PathBuf};

/// `--repo-url`, then `[links].repo_url`, then the origin remote.
fn repo_url(ctx: &AppContext, args: &LinksArgs) -> Result<String> {
    let explicit = args
        .repo_url
        .clone()
        .or_else(|| ctx.config.links.repo_url.clone());
    let url = match explicit {
        Some(url) => url,
        None => ctx
            .git
            .remote_url(&ctx.root, "origin")
            .ok()
            .flatten()
            .as_deref()
            .and_then(parse_github_remote)
            .map(|slug| format!("https://github.com/{}", slug))
            .ok_or_else(|| KitError::MissingConfigError {
                field: "links.repo_url".to_string(),
            })?,
    };
    validate_url("repo_url", &url)?;
    Ok(url)
}

fn absolute(path: &Path) -> Result<PathBuf> {
    let path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    Ok(std::fs::canonicalize(&path).unwrap_or(path))
}

/// Pages to rewrite, paired with their path relative to the docs dir.
fn pages(docs_dir: &Path, files: &[PathBuf]) -> Result<Vec<(PathBuf, String)>> {
    let docs_dir = std::fs::canonicalize(docs_dir).unwrap_or_else(|_| docs_dir.to_path_buf());
    if files.is_empty() {
        if !docs_dir.is_dir() {
            return Err(KitError::not_found(docs_dir.display()));
        }
        return Ok(walk_files(&docs_dir, &Exclusions::default())
            .into_iter()
            .filter(|p| p.extension().is_some_and(|e| e == "md"))
            .map(|p| {
                let rel = relative_display(&docs_dir, &p);
                (p, rel)
            })
            .collect());
    }

    files
        .iter()
        .map(|file| {
            let path = absolute(file)?;
            if !path.is_file() {
                return Err(KitError::not_found(file.display()));
            }
            if !path.starts_with(&docs_dir) {
                return Err(KitError::ValidationError {
                    message: format!("{} is not under {}", file.display(), docs_dir.display()),
                });
            }
            let rel = relative_display(&docs_dir, &path);
            Ok((path, rel))
        })
        .collect()
}

pub fn run(ctx: &AppContext, args: &LinksArgs) -> Result<Gate> {
    let url = repo_url(ctx, args)?;
    let branch = args.branch.as_deref().unwrap_or(&ctx.config.links.branch);
    let docs_dir = ctx.path(args.docs_dir.as_deref().unwrap_or(&ctx.config.links.docs_dir));
    let rewriter = LinkRewriter::new(&url, branch);

    let pages = pages(&docs_dir, &args.files)?;
    let print_content = pages.len() == 1 && !args.files.is_empty() && !args.write && !args.check;

    let mut total = 0;
    for (path, rel) in &pages {
        let markdown = std::fs::read_to_string(path)?;
        let (rewritten, count) = rewriter.rewrite(&markdown, rel);
        total += count;

        if print_content {
            print!("{}", rewritten);
            continue;
        }
        if count > 0 {
            println!("{}: {} link(s)", rel, count);
            if args.write {
                std::fs::write(path, &rewritten)?;
            }
        }
    }

    if !print_content {
        let verb = if args.write { "Rewrote" } else { "Found" };
        println!("{} {} repo-relative link(s) in {} page(s).", verb, total, pages.len());
    }
    Ok(Gate::from_failures(args.check && total > 0))
}
