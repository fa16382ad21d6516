use crate::domain::model::DeletionScope;
use crate::utils::error::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};

pub trait GitClient: Send + Sync {
    fn toplevel(&self, cwd: &Path) -> Option<PathBuf>;
    /// Tag names matching a `git tag --list` pattern.
    fn tags(&self, root: &Path, pattern: &str) -> Result<Vec<String>>;
    /// Repo-relative paths deleted in `scope`.
    fn deleted_paths(&self, root: &Path, scope: &DeletionScope) -> Result<Vec<String>>;
    fn remote_url(&self, root: &Path, remote: &str) -> Result<Option<String>>;
}

/// REST access to GitHub. Paths are relative to the API base (`repos/o/r/tags`).
#[async_trait]
pub trait GitHubApi: Send + Sync {
    /// `Ok(None)` on 404.
    async fn get_json(&self, path: &str) -> Result<Option<Value>>;
    async fn post_json(&self, path: &str, body: &Value) -> Result<Value>;
    async fn patch_json(&self, path: &str, body: &Value) -> Result<Value>;
}
