use super::pins::repo_slug;
use crate::domain::model::{ActionRow, RowFilter, Staleness};
use crate::utils::colors::Palette;
use std::collections::HashSet;

pub fn filter_rows(rows: Vec<ActionRow>, filter: RowFilter) -> Vec<ActionRow> {
    rows.into_iter().filter(|r| filter.accepts(r)).collect()
}

/// First row per `owner/repo`.
pub fn unique_by_slug<'r, I>(rows: I) -> Vec<&'r ActionRow>
where
    I: IntoIterator<Item = &'r ActionRow>,
{
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter(|r| seen.insert(repo_slug(&r.action)))
        .collect()
}

pub fn needs_attention(rows: &[ActionRow]) -> bool {
    rows.iter().any(|r| r.stale.needs_update() || r.upgradable)
}

fn pad(text: &str, width: usize) -> String {
    format!("{:<width$}", text, width = width)
}

fn column_width<'r>(header: &str, values: impl Iterator<Item = &'r str>) -> usize {
    values.map(|v| v.chars().count()).max().unwrap_or(0).max(header.len())
}

/// Aligned table. Padding is applied before styling so ANSI codes don't skew columns.
pub fn render_table(rows: &[ActionRow], palette: &Palette) -> String {
    if rows.is_empty() {
        return "  No SHA-pinned actions found.".to_string();
    }

    let has_latest = rows.iter().any(|r| r.latest_tag.is_some());
    let dash = |t: &Option<String>| t.clone().unwrap_or_else(|| "-".to_string());

    let w_file = column_width("File", rows.iter().map(|r| r.file.as_str()));
    let w_action = column_width("Action", rows.iter().map(|r| r.action.as_str()));
    let w_comment = column_width("Comment", rows.iter().map(|r| r.comment_tag.as_deref().unwrap_or("-")));
    let w_resolved = column_width("Resolved", rows.iter().map(|r| r.resolved_tag.as_deref().unwrap_or("-")));
    let w_latest = column_width("Latest", rows.iter().map(|r| r.latest_tag.as_deref().unwrap_or("-")));

    let mut header = format!(
        "  {}  {}  {}  {}  ",
        pad("File", w_file),
        pad("Action", w_action),
        pad("Comment", w_comment),
        pad("Resolved", w_resolved)
    );
    if has_latest {
        header.push_str(&format!("{}  Upgrade?", pad("Latest", w_latest)));
    } else {
        header.push_str("Stale?");
    }

    let mut out = vec![
        palette.bold(&header),
        palette.dim(&format!("  {}", "-".repeat(header.chars().count() - 2))),
    ];

    for r in rows {
        let mut line = format!(
            "  {}  {}  {}  {}  ",
            palette.dim(&pad(&r.file, w_file)),
            palette.cyan(&pad(&r.action, w_action)),
            pad(&dash(&r.comment_tag), w_comment),
            pad(&dash(&r.resolved_tag), w_resolved),
        );
        if has_latest {
            let latest = pad(&dash(&r.latest_tag), w_latest);
            if r.upgradable {
                line.push_str(&format!("{}  {}", palette.yellow(&latest), palette.yellow("^")));
            } else {
                line.push_str(&palette.green(&latest));
            }
        } else {
            let flag = r.stale.flag();
            line.push_str(&match r.stale {
                Staleness::Stale | Staleness::Missing => palette.red(flag),
                Staleness::NoDescription => palette.yellow(flag),
                Staleness::Current => String::new(),
            });
        }
        out.push(line.trim_end().to_string());
    }
    out.join("\n")
}

pub fn render_summary(rows: &[ActionRow], palette: &Palette) -> String {
    let stale = rows
        .iter()
        .filter(|r| matches!(r.stale, Staleness::Stale | Staleness::Missing))
        .count();
    let no_desc = rows
        .iter()
        .filter(|r| r.stale == Staleness::NoDescription)
        .count();

    let mut out = Vec::new();
    if stale > 0 || no_desc > 0 {
        let mut parts = Vec::new();
        if stale > 0 {
            parts.push(format!(
                "{} version(s) ({} = stale, {} = missing)",
                stale,
                palette.red("^"),
                palette.red("+")
            ));
        }
        if no_desc > 0 {
            parts.push(format!(
                "{} description(s) ({} = no desc)",
                no_desc,
                palette.yellow("d")
            ));
        }
        out.push(format!("\n  {} {}", palette.yellow("Needs updating:"), parts.join(", ")));
    } else {
        out.push(format!("\n  {}", palette.green("All comments are up to date.")));
    }

    let upgradable = unique_by_slug(rows.iter().filter(|r| r.upgradable)).len();
    if upgradable > 0 {
        out.push(format!(
            "  {} action(s) can be upgraded ({} = upgrade available)",
            palette.yellow(&upgradable.to_string()),
            palette.yellow("^")
        ));
    }
    out.join("\n")
}
