use super::pins::{classify, repo_slug, PinnedAction};
use crate::domain::model::ActionRow;
use crate::domain::ports::GitHubApi;
use crate::utils::error::KitError;
use base64::Engine;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::OnceLock;

const TAG_PAGE_SIZE: usize = 100;
const MAX_TAG_PAGES: usize = 5;
const DESCRIPTION_MAX_CHARS: usize = 50;

fn semver_like_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^v?\d+\.\d+").expect("static regex"))
}

fn boilerplate_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)^(This action\s+|A GitHub Action (that |for |to )|GitHub Action[,]?\s*(that |for |to )?)",
        )
        .expect("static regex")
    })
}

/// Tag lookups against the GitHub API, memoised for one run.
///
/// API failures are logged and treated as "unknown"; a 403 is reported once
/// with a hint about `GITHUB_TOKEN`.
pub struct WorkflowAuditor<'a, A: GitHubApi + ?Sized> {
    api: &'a A,
    resolved: HashMap<String, Option<String>>,
    latest: HashMap<String, Option<String>>,
    descriptions: HashMap<String, Option<String>>,
    rate_limit_reported: bool,
}

impl<'a, A: GitHubApi + ?Sized> WorkflowAuditor<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self {
            api,
            resolved: HashMap::new(),
            latest: HashMap::new(),
            descriptions: HashMap::new(),
            rate_limit_reported: false,
        }
    }

    async fn fetch(&mut self, path: &str) -> Option<Value> {
        match self.api.get_json(path).await {
            Ok(value) => value,
            Err(KitError::RateLimited) => {
                if !self.rate_limit_reported {
                    tracing::warn!(
                        "GitHub API rate limit reached. Set GITHUB_TOKEN for 5,000 req/hr (60/hr unauthenticated)."
                    );
                    self.rate_limit_reported = true;
                }
                None
            }
            Err(e) => {
                tracing::warn!("GitHub API lookup failed: {}", e);
                None
            }
        }
    }

    async fn peel_to_commit(&mut self, slug: &str, tag_object_sha: &str) -> Option<String> {
        let data = self
            .fetch(&format!("repos/{}/git/tags/{}", slug, tag_object_sha))
            .await?;
        data["object"]["sha"].as_str().map(str::to_string)
    }

    /// Ref objects whose name is exactly `tag`, as `(sha, type)`.
    async fn matching_tag_refs(&mut self, slug: &str, tag: &str) -> Vec<(String, String)> {
        let Some(Value::Array(refs)) = self
            .fetch(&format!("repos/{}/git/matching-refs/tags/{}", slug, tag))
            .await
        else {
            return Vec::new();
        };
        let full = format!("refs/tags/{}", tag);
        refs.iter()
            .filter(|r| r["ref"].as_str() == Some(full.as_str()))
            .map(|r| {
                (
                    r["object"]["sha"].as_str().unwrap_or_default().to_string(),
                    r["object"]["type"].as_str().unwrap_or_default().to_string(),
                )
            })
            .collect()
    }

    async fn tag_points_at(&mut self, slug: &str, tag: &str, sha: &str) -> bool {
        if let Some((ref_sha, ref_type)) = self.matching_tag_refs(slug, tag).await.into_iter().next() {
            if ref_sha == sha {
                return true;
            }
            if ref_type == "tag" {
                return self.peel_to_commit(slug, &ref_sha).await.as_deref() == Some(sha);
            }
        }
        false
    }

    async fn scan_tags_for(&mut self, slug: &str, sha: &str) -> Option<String> {
        for page in 1..=MAX_TAG_PAGES {
            let Some(Value::Array(tags)) = self
                .fetch(&format!(
                    "repos/{}/tags?per_page={}&page={}",
                    slug, TAG_PAGE_SIZE, page
                ))
                .await
            else {
                break;
            };
            if tags.is_empty() {
                break;
            }

            let best = tags
                .iter()
                .filter(|t| t["commit"]["sha"].as_str() == Some(sha))
                .filter_map(|t| t["name"].as_str())
                .fold(None::<&str>, |best, name| match best {
                    Some(b) if b.matches('.').count() >= name.matches('.').count() => Some(b),
                    _ => Some(name),
                });
            if let Some(name) = best {
                return Some(name.to_string());
            }
            if tags.len() < TAG_PAGE_SIZE {
                break;
            }
        }
        None
    }

    /// Tag that `sha` is published as. `hint` (the comment tag) is checked first.
    pub async fn resolve_tag(&mut self, action: &str, sha: &str, hint: Option<&str>) -> Option<String> {
        let key = format!("{}@{}", action, sha);
        if let Some(cached) = self.resolved.get(&key) {
            return cached.clone();
        }

        let slug = repo_slug(action);
        let mut found = None;
        if let Some(hint) = hint {
            if self.tag_points_at(&slug, hint, sha).await {
                found = Some(hint.to_string());
            }
        }
        if found.is_none() {
            found = self.scan_tags_for(&slug, sha).await;
        }

        tracing::debug!("{} resolved to {:?}", key, found);
        self.resolved.insert(key, found.clone());
        found
    }

    /// Newest version-looking release tag of `slug`.
    pub async fn latest_tag(&mut self, slug: &str) -> Option<String> {
        if let Some(cached) = self.latest.get(slug) {
            return cached.clone();
        }

        let mut found = None;
        if let Some(release) = self.fetch(&format!("repos/{}/releases/latest", slug)).await {
            found = release["tag_name"]
                .as_str()
                .filter(|t| semver_like_regex().is_match(t))
                .map(str::to_string);
        }
        if found.is_none() {
            if let Some(Value::Array(tags)) = self.fetch(&format!("repos/{}/tags?per_page=30", slug)).await {
                found = tags
                    .iter()
                    .filter_map(|t| t["name"].as_str())
                    .find(|t| semver_like_regex().is_match(t))
                    .map(str::to_string);
            }
        }

        self.latest.insert(slug.to_string(), found.clone());
        found
    }

    /// Commit SHA for `tag`, peeling annotated tags.
    pub async fn resolve_sha_for_tag(&mut self, slug: &str, tag: &str) -> Option<String> {
        for (ref_sha, ref_type) in self.matching_tag_refs(slug, tag).await {
            match ref_type.as_str() {
                "commit" => return Some(ref_sha),
                "tag" => return self.peel_to_commit(slug, &ref_sha).await,
                _ => {}
            }
        }
        None
    }

    /// Shortened `description:` from the action's metadata file.
    pub async fn action_description(&mut self, action: &str) -> Option<String> {
        if let Some(cached) = self.descriptions.get(action) {
            return cached.clone();
        }

        let parts: Vec<&str> = action.split('/').collect();
        let mut found = None;
        if parts.len() >= 2 {
            let slug = format!("{}/{}", parts[0], parts[1]);
            let sub_path = parts[2..].join("/");
            for filename in ["action.yml", "action.yaml"] {
                let path = if sub_path.is_empty() {
                    filename.to_string()
                } else {
                    format!("{}/{}", sub_path, filename)
                };
                let Some(data) = self.fetch(&format!("repos/{}/contents/{}", slug, path)).await else {
                    continue;
                };
                let Some(content) = data["content"].as_str() else {
                    continue;
                };
                let Some(text) = decode_content(content) else {
                    continue;
                };
                found = metadata_description(&text).map(|d| shorten_description(&d));
                if found.is_some() {
                    break;
                }
            }
        }

        self.descriptions.insert(action.to_string(), found.clone());
        found
    }

    /// Looks up every pin. `offline` skips the API entirely.
    pub async fn build_rows(&mut self, pins: &[PinnedAction], offline: bool) -> Vec<ActionRow> {
        let mut rows = Vec::with_capacity(pins.len());
        for pin in pins {
            let (resolved, latest) = if offline {
                (None, None)
            } else {
                let resolved = self
                    .resolve_tag(&pin.action, &pin.sha, pin.comment.tag.as_deref())
                    .await;
                let latest = self.latest_tag(&repo_slug(&pin.action)).await;
                (resolved, latest)
            };
            rows.push(classify(pin, resolved, latest));
        }
        rows
    }
}

/// The contents API returns base64 with embedded newlines.
fn decode_content(content: &str) -> Option<String> {
    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD.decode(compact).ok()?;
    String::from_utf8(bytes).ok()
}

/// First non-empty top-level `description:` scalar. Block scalars yield `None`.
pub fn metadata_description(yaml: &str) -> Option<String> {
    for line in yaml.lines() {
        let Some(rest) = line.strip_prefix("description:") else {
            continue;
        };
        let value = rest.trim();
        if value.is_empty() {
            continue;
        }
        if matches!(value, ">" | "|" | ">-" | "|-") {
            return None;
        }
        let bytes = value.as_bytes();
        let quoted = bytes.len() >= 2
            && (bytes[0] == b'"' || bytes[0] == b'\'')
            && bytes[bytes.len() - 1] == bytes[0];
        let value = if quoted { &value[1..value.len() - 1] } else { value };
        return Some(value.to_string());
    }
    None
}

pub fn shorten_description(desc: &str) -> String {
    let stripped = boilerplate_regex().replace(desc, "");
    let sentence = stripped
        .split(['.', '!', ';'])
        .next()
        .unwrap_or("")
        .trim();
    let trimmed = sentence.trim_end_matches(['.', ',', ';', ':', '!']);

    let mut chars = trimmed.chars();
    let mut short = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
        None => String::new(),
    };

    if short.chars().count() > DESCRIPTION_MAX_CHARS {
        let mut truncated: String = short.chars().take(DESCRIPTION_MAX_CHARS - 3).collect();
        if let Some(space) = truncated.rfind(' ') {
            if truncated[..space].chars().count() > 30 {
                truncated.truncate(space);
            }
        }
        short = format!("{}…", truncated);
    }
    short
}
