use crate::utils::error::{KitError, Result};
use chrono::NaiveDate;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

fn completed_item_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^- \[[xX]\] .+$").expect("static regex"))
}

fn blank_run_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{3,}").expect("static regex"))
}

/// Result of moving checked items between the two notes files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivePlan {
    pub month: String,
    pub items: Vec<String>,
    pub todo_content: String,
    pub archive_content: String,
}

impl ArchivePlan {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

pub fn month_label(date: NaiveDate) -> String {
    date.format("%B %Y").to_string()
}

/// Pure transformation of both documents. `date` picks the month section.
pub fn plan_archive(todo: &str, archive: &str, date: NaiveDate) -> ArchivePlan {
    let month = month_label(date);
    let re = completed_item_regex();

    let mut items = Vec::new();
    let mut kept = String::with_capacity(todo.len());
    for line in todo.split_inclusive('\n') {
        let body = line.strip_suffix('\n').unwrap_or(line);
        if re.is_match(body) {
            items.push(body.to_string());
        } else {
            kept.push_str(line);
        }
    }

    if items.is_empty() {
        return ArchivePlan {
            month,
            items,
            todo_content: todo.to_string(),
            archive_content: archive.to_string(),
        };
    }

    let todo_content = blank_run_regex().replace_all(&kept, "\n\n").into_owned();

    let header = format!("## {}", month);
    let mut archive_content = archive.to_string();
    if !archive_content.contains(&header) {
        if !archive_content.ends_with('\n') {
            archive_content.push('\n');
        }
        archive_content.push_str(&format!("\n{}\n\n### Completed\n\n", header));
    }

    let items_text = format!("{}\n", items.join("\n"));
    match completed_insert_position(&archive_content, &header) {
        Some(pos) => archive_content.insert_str(pos, &items_text),
        None => archive_content.push_str(&items_text),
    }

    ArchivePlan {
        month,
        items,
        todo_content,
        archive_content,
    }
}

/// Byte offset just past the first `### Completed` heading (and its blank
/// lines) that follows the month header.
fn completed_insert_position(archive: &str, header: &str) -> Option<usize> {
    const COMPLETED: &str = "### Completed\n";
    let header_at = archive.find(header)?;
    let rel = archive[header_at..].find(COMPLETED)?;
    let mut pos = header_at + rel + COMPLETED.len();
    pos += archive[pos..].bytes().take_while(|b| *b == b'\n').count();
    Some(pos)
}

/// Reads both files, plans the move, and writes unless `dry_run`.
pub fn archive_completed(
    todo_file: &Path,
    archive_file: &Path,
    date: NaiveDate,
    dry_run: bool,
) -> Result<ArchivePlan> {
    for file in [todo_file, archive_file] {
        if !file.exists() {
            return Err(KitError::not_found(file.display()));
        }
    }

    let todo = std::fs::read_to_string(todo_file)?;
    let archive = std::fs::read_to_string(archive_file)?;
    let plan = plan_archive(&todo, &archive, date);

    if plan.is_empty() || dry_run {
        return Ok(plan);
    }

    std::fs::write(todo_file, &plan.todo_content)?;
    std::fs::write(archive_file, &plan.archive_content)?;
    tracing::info!(
        "Archived {} item(s) into {}",
        plan.items.len(),
        archive_file.display()
    );
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn jan() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()
    }

    #[test]
    fn test_moves_checked_items_into_new_month() {
        let todo = "# Todo\n\n- [ ] keep\n- [x] done one\n\n- [X] done two\n\n\n- [ ] also keep\n";
        let archive = "# Archive";

        let plan = plan_archive(todo, archive, jan());
        assert_eq!(plan.items, vec!["- [x] done one", "- [X] done two"]);
        assert_eq!(plan.todo_content, "# Todo\n\n- [ ] keep\n\n- [ ] also keep\n");
        assert_eq!(
            plan.archive_content,
            "# Archive\n\n## January 2026\n\n### Completed\n\n- [x] done one\n- [X] done two\n"
        );
    }

    #[test]
    fn test_inserts_at_top_of_existing_month() {
        let archive = "# Archive\n\n## January 2026\n\n### Completed\n\n- [x] older\n";
        let plan = plan_archive("- [x] newer\n", archive, jan());
        assert_eq!(
            plan.archive_content,
            "# Archive\n\n## January 2026\n\n### Completed\n\n- [x] newer\n- [x] older\n"
        );
    }

    #[test]
    fn test_month_without_completed_heading_appends() {
        let archive = "## January 2026\n\nnotes\n";
        let plan = plan_archive("- [x] item\n", archive, jan());
        assert_eq!(plan.archive_content, "## January 2026\n\nnotes\n- [x] item\n");
    }

    #[test]
    fn test_nothing_to_archive() {
        let plan = plan_archive("- [ ] open\n- [x]\n", "# Archive\n", jan());
        assert!(plan.is_empty());
        assert_eq!(plan.todo_content, "- [ ] open\n- [x]\n");
    }

    #[test]
    fn test_archive_completed_dry_run_and_write() {
        let dir = TempDir::new().unwrap();
        let todo = dir.path().join("todo.md");
        let archive = dir.path().join("archive.md");
        std::fs::write(&todo, "- [x] ship it\n- [ ] next\n").unwrap();
        std::fs::write(&archive, "# Archive\n").unwrap();

        let plan = archive_completed(&todo, &archive, jan(), true).unwrap();
        assert_eq!(plan.items.len(), 1);
        assert_eq!(std::fs::read_to_string(&todo).unwrap(), "- [x] ship it\n- [ ] next\n");

        archive_completed(&todo, &archive, jan(), false).unwrap();
        assert_eq!(std::fs::read_to_string(&todo).unwrap(), "- [ ] next\n");
        assert!(std::fs::read_to_string(&archive)
            .unwrap()
            .contains("### Completed\n\n- [x] ship it\n"));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = archive_completed(
            &dir.path().join("todo.md"),
            &dir.path().join("archive.md"),
            jan(),
            false,
        )
        .unwrap_err();
        assert!(matches!(err, KitError::NotFound { .. }));
    }
}
