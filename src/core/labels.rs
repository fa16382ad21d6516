use crate::domain::model::Label;
use crate::domain::ports::{GitClient, GitHubApi};
use crate::utils::error::{KitError, Result};
use crate::utils::validation::validate_repo_slug;
use serde_json::json;
use std::path::Path;
use url::Url;

/// Labels from `<dir>/<set>.json`, colours without a leading `#`.
pub fn load_label_set(labels_dir: &Path, set: &str) -> Result<Vec<Label>> {
    let path = labels_dir.join(format!("{}.json", set));
    if !path.is_file() {
        return Err(KitError::not_found(path.display()));
    }
    let text = std::fs::read_to_string(&path)?;
    let mut labels: Vec<Label> = serde_json::from_str(&text)?;
    for label in &mut labels {
        label.color = label.color.trim_start_matches('#').to_string();
    }
    Ok(labels)
}

/// `owner/repo` from an https or ssh GitHub remote URL.
pub fn parse_github_remote(remote: &str) -> Option<String> {
    let remote = remote.trim();
    let path = if let Some(rest) = remote.strip_prefix("git@github.com:") {
        rest.to_string()
    } else {
        let url = Url::parse(remote).ok()?;
        if url.host_str() != Some("github.com") {
            return None;
        }
        url.path().trim_start_matches('/').to_string()
    };

    let path = path.trim_end_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    let mut parts = path.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(owner), Some(repo), None) if !owner.is_empty() && !repo.is_empty() => {
            Some(format!("{}/{}", owner, repo))
        }
        _ => None,
    }
}

/// The explicit `--repo`, else the slug of the `origin` remote.
pub fn resolve_repo(explicit: Option<&str>, git: &dyn GitClient, root: &Path) -> Result<String> {
    let repo = match explicit {
        Some(repo) => repo.to_string(),
        None => git
            .remote_url(root, "origin")?
            .as_deref()
            .and_then(parse_github_remote)
            .ok_or_else(|| {
                KitError::config(
                    "could not determine repo. Run inside a GitHub clone or pass --repo OWNER/REPO",
                )
            })?,
    };
    validate_repo_slug("repo", &repo)?;
    Ok(repo)
}

/// Label name as a single percent-encoded path segment.
fn encode_segment(name: &str) -> String {
    let mut url = match Url::parse("https://placeholder.invalid/") {
        Ok(url) => url,
        Err(_) => return name.to_string(),
    };
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.push(name);
    }
    url.path().trim_start_matches('/').to_string()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertSummary {
    pub created: usize,
    pub updated: usize,
}

pub fn dry_run_line(label: &Label) -> String {
    format!("[DRY] upsert: {} (#{}) - {}", label.name, label.color, label.description)
}

/// Creates each label, falling back to an update when creation fails.
/// Stops at the first label that can be neither created nor updated.
pub async fn upsert_labels<A: GitHubApi + ?Sized>(
    api: &A,
    repo: &str,
    labels: &[Label],
) -> Result<UpsertSummary> {
    let mut summary = UpsertSummary::default();

    for label in labels {
        let created = api
            .post_json(
                &format!("repos/{}/labels", repo),
                &json!({
                    "name": label.name,
                    "color": label.color,
                    "description": label.description,
                }),
            )
            .await;
        match created {
            Ok(_) => {
                tracing::debug!("Created label {}", label.name);
                summary.created += 1;
                continue;
            }
            Err(e) => tracing::debug!("Create failed for {}: {}", label.name, e),
        }

        let updated = api
            .patch_json(
                &format!("repos/{}/labels/{}", repo, encode_segment(&label.name)),
                &json!({
                    "new_name": label.name,
                    "color": label.color,
                    "description": label.description,
                }),
            )
            .await;
        match updated {
            Ok(_) => {
                tracing::debug!("Updated label {}", label.name);
                summary.updated += 1;
            }
            Err(e) => {
                tracing::error!("Failed to upsert label: {}", label.name);
                return Err(e);
            }
        }
    }

    Ok(summary)
}
