use super::pins::{repo_slug, PinLine};
use crate::domain::model::ActionRow;
use crate::utils::error::Result;
use regex::{NoExpand, Regex};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::OnceLock;

fn paren_version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\(v?\d+\.\d+[.\d]*\)").expect("static regex"))
}

fn comment_rest_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"#\s*v?\S+.*").expect("static regex"))
}

fn comment_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"#\s*v?\S+").expect("static regex"))
}

fn bare_version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"#\s*v?\d+\.\d+\S*").expect("static regex"))
}

/// New trailing comment for a pin whose comment is out of date.
pub fn refresh_comment(trail: &str, tag: &str, has_description: bool, description: Option<&str>) -> String {
    let annotated = match description {
        Some(desc) => format!("# {} ({})", desc, tag),
        None => format!("# {}", tag),
    };

    if !trail.contains('#') {
        return format!(" {}", annotated);
    }
    if has_description {
        return paren_version_regex()
            .replace(trail, NoExpand(&format!("({})", tag)))
            .into_owned();
    }
    match description {
        Some(_) => comment_rest_regex().replace(trail, NoExpand(&annotated)).into_owned(),
        None => comment_tag_regex().replace(trail, NoExpand(&annotated)).into_owned(),
    }
}

/// Trailing comment after moving a pin to `tag`.
pub fn retag_comment(trail: &str, tag: &str) -> String {
    if !trail.contains('#') {
        return format!(" # {}", tag);
    }
    let replaced = paren_version_regex()
        .replace_all(trail, NoExpand(&format!("({})", tag)))
        .into_owned();
    if replaced != trail {
        return replaced;
    }
    bare_version_regex()
        .replace(trail, NoExpand(&format!("# {}", tag)))
        .into_owned()
}

fn split_line_ending(line: &str) -> (&str, &str) {
    if let Some(body) = line.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = line.strip_suffix('\n') {
        (body, "\n")
    } else {
        (line, "")
    }
}

/// Applies `edit` to the given 1-based lines of `path`; returns how many changed.
fn rewrite_lines<F>(path: &Path, line_numbers: &[usize], dry_run: bool, mut edit: F) -> Result<usize>
where
    F: FnMut(usize, &PinLine) -> Option<String>,
{
    let text = std::fs::read_to_string(path)?;
    let mut lines: Vec<String> = text.split_inclusive('\n').map(str::to_string).collect();
    let mut modified = 0;

    for &lineno in line_numbers {
        let Some(original) = lineno.checked_sub(1).and_then(|idx| lines.get(idx)) else {
            continue;
        };
        let (body, ending) = split_line_ending(original);
        let Some(pin) = PinLine::parse(body) else {
            continue;
        };
        let Some(new_body) = edit(lineno, &pin) else {
            continue;
        };
        let new_line = format!("{}{}", new_body, ending);
        if new_line != *original {
            lines[lineno - 1] = new_line;
            modified += 1;
        }
    }

    if modified > 0 && !dry_run {
        std::fs::write(path, lines.concat())?;
        tracing::debug!("Rewrote {} line(s) in {}", modified, path.display());
    }
    Ok(modified)
}

fn group_by_file<'r>(rows: impl Iterator<Item = &'r ActionRow>) -> BTreeMap<&'r str, Vec<&'r ActionRow>> {
    let mut by_file: BTreeMap<&str, Vec<&ActionRow>> = BTreeMap::new();
    for row in rows {
        by_file.entry(row.file.as_str()).or_default().push(row);
    }
    by_file
}

/// Rows whose comment should be rewritten: flagged, with a known tag.
pub fn rows_needing_comments(rows: &[ActionRow]) -> Vec<&ActionRow> {
    rows.iter()
        .filter(|r| r.stale.needs_update() && r.current_tag().is_some())
        .collect()
}

/// Rewrites comments of flagged rows. `descriptions` maps action to its short description.
pub fn update_comments(
    workflows_dir: &Path,
    rows: &[ActionRow],
    descriptions: &HashMap<String, Option<String>>,
) -> Result<usize> {
    let mut total = 0;
    for (file, file_rows) in group_by_file(rows_needing_comments(rows).into_iter()) {
        let by_line: HashMap<usize, &ActionRow> = file_rows.iter().map(|r| (r.line, *r)).collect();
        let mut line_numbers: Vec<usize> = by_line.keys().copied().collect();
        line_numbers.sort_unstable();

        total += rewrite_lines(&workflows_dir.join(file), &line_numbers, false, |lineno, pin| {
            let row = by_line.get(&lineno)?;
            let tag = row.current_tag()?;
            let description = if row.has_description {
                None
            } else {
                descriptions.get(&row.action).and_then(|d| d.as_deref())
            };
            let trail = refresh_comment(&pin.trail, tag, row.has_description, description);
            Some(pin.render(&pin.sha, &trail))
        })?;
    }
    Ok(total)
}

/// Points every pin of `slug` at `new_sha` and retags its comment.
pub fn upgrade_action(
    workflows_dir: &Path,
    rows: &[ActionRow],
    slug: &str,
    new_sha: &str,
    tag: &str,
    dry_run: bool,
) -> Result<usize> {
    let matching = rows.iter().filter(|r| repo_slug(&r.action) == slug);
    let mut total = 0;
    for (file, file_rows) in group_by_file(matching) {
        let line_numbers: Vec<usize> = file_rows.iter().map(|r| r.line).collect();
        total += rewrite_lines(&workflows_dir.join(file), &line_numbers, dry_run, |_, pin| {
            Some(pin.render(new_sha, &retag_comment(&pin.trail, tag)))
        })?;
    }
    Ok(total)
}
