use crate::domain::model::DeletionScope;
use crate::domain::ports::GitClient;
use crate::utils::error::{KitError, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Runs the `git` binary found on PATH.
#[derive(Debug, Clone, Default)]
pub struct ProcessGit;

impl ProcessGit {
    pub fn new() -> Self {
        Self
    }

    fn run(&self, cwd: &Path, args: &[&str]) -> Result<String> {
        tracing::debug!("git {}", args.join(" "));
        let output = Command::new("git")
            .args(args)
            .current_dir(cwd)
            .output()
            .map_err(|e| KitError::GitError {
                message: format!("could not run git: {}", e),
            })?;

        if !output.status.success() {
            return Err(KitError::GitError {
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl GitClient for ProcessGit {
    fn toplevel(&self, cwd: &Path) -> Option<PathBuf> {
        self.run(cwd, &["rev-parse", "--show-toplevel"])
            .ok()
            .map(|out| PathBuf::from(out.trim()))
            .filter(|p| !p.as_os_str().is_empty())
    }

    fn tags(&self, root: &Path, pattern: &str) -> Result<Vec<String>> {
        let out = self.run(root, &["tag", "--list", pattern])?;
        Ok(out
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn deleted_paths(&self, root: &Path, scope: &DeletionScope) -> Result<Vec<String>> {
        let out = match scope {
            DeletionScope::Staged => self.run(
                root,
                &["diff", "--cached", "--name-status", "--diff-filter=D"],
            )?,
            DeletionScope::Range(range) => self.run(
                root,
                &["diff", "--name-status", "--diff-filter=D", range.as_str()],
            )?,
        };
        Ok(parse_name_status_deletions(&out))
    }

    fn remote_url(&self, root: &Path, remote: &str) -> Result<Option<String>> {
        match self.run(root, &["remote", "get-url", remote]) {
            Ok(out) => Ok(Some(out.trim().to_string()).filter(|u| !u.is_empty())),
            Err(KitError::GitError { message }) => {
                tracing::debug!("No '{}' remote: {}", remote, message);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

/// Paths from `--name-status` lines whose status is `D`.
pub fn parse_name_status_deletions(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| {
            let (status, path) = line.split_once('\t')?;
            (status.trim() == "D").then(|| path.trim().to_string())
        })
        .collect()
}
