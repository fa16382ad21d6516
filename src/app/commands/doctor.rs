use crate::app::{AppContext, Gate};
use crate::config::cli::DoctorArgs;
use crate::core::repo_doctor::{
    evaluate, load_profile_rules, load_rules_file, render_report, FormatOptions, Rule, RuleFilter,
};
use crate::domain::model::{DeletionScope, Level};
use crate::utils::error::Result;
use std::collections::BTreeSet;

/// Which checks a doctor run performs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub check_missing: bool,
    pub deletions: Option<DeletionScope>,
}

impl Scope {
    /// No scope flag means missing plus staged. `--diff` replaces `--staged`.
    pub fn from_args(args: &DoctorArgs) -> Self {
        let any = args.missing || args.staged || args.diff.is_some();
        let deletions = match &args.diff {
            Some(range) => Some(DeletionScope::Range(range.clone())),
            None if args.staged || !any => Some(DeletionScope::Staged),
            None => None,
        };
        Self {
            check_missing: args.missing || !any,
            deletions,
        }
    }
}

fn load_rules(ctx: &AppContext, args: &DoctorArgs) -> (Vec<Rule>, BTreeSet<String>) {
    let (mut rules, settings) = load_rules_file(&ctx.path(&ctx.config.paths.doctor_rules));

    let mut profiles = settings.profiles.clone();
    for name in &args.profile {
        if !profiles.contains(name) {
            profiles.push(name.clone());
        }
    }
    if !profiles.is_empty() {
        let dir = ctx.path(&ctx.config.paths.doctor_profiles_dir);
        rules.extend(load_profile_rules(&dir, &profiles));
    }
    (rules, settings.ignore_missing)
}

pub fn run(ctx: &AppContext, args: &DoctorArgs) -> Result<Gate> {
    let (rules, ignore_missing) = load_rules(ctx, args);
    if rules.is_empty() {
        println!("Repo doctor: no rules found");
        return Ok(Gate::Pass);
    }

    let filter = RuleFilter {
        min_level: if args.include_info { Level::Info } else { args.min_level },
        category: args.category.clone(),
        ignore_missing,
    };
    let rules = filter.apply(rules);

    let scope = Scope::from_args(args);
    let deleted: BTreeSet<String> = match &scope.deletions {
        Some(deletions) => match ctx.git.deleted_paths(&ctx.root, deletions) {
            Ok(paths) => paths.into_iter().collect(),
            Err(e) => {
                tracing::warn!("Could not list deleted paths: {}", e);
                BTreeSet::new()
            }
        },
        None => BTreeSet::new(),
    };

    let findings = evaluate(&ctx.root, &rules, scope.check_missing, &deleted);
    let options = FormatOptions {
        hints: !args.no_hints,
        links: !args.no_links,
        fix: args.fix,
    };
    println!("{}", render_report(&findings, options));
    Ok(Gate::Pass)
}
