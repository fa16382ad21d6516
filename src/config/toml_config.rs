use crate::utils::error::{KitError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub const DEFAULT_CONFIG_FILE: &str = "repokit.toml";
pub const DEFAULT_TODO_PATTERN: &str = "TODO (template users)";
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KitConfig {
    pub paths: PathsConfig,
    pub todos: TodosConfig,
    pub github: GitHubConfig,
    pub links: LinksConfig,
    pub diagnostics: DiagnosticsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub workflows_dir: String,
    pub changelog: String,
    pub todo_file: String,
    pub archive_file: String,
    pub labels_dir: String,
    pub doctor_rules: String,
    pub doctor_profiles_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            workflows_dir: ".github/workflows".to_string(),
            changelog: "CHANGELOG.md".to_string(),
            todo_file: "docs/notes/todo.md".to_string(),
            archive_file: "docs/notes/archive.md".to_string(),
            labels_dir: "labels".to_string(),
            doctor_rules: ".repo-doctor.toml".to_string(),
            doctor_profiles_dir: "repo_doctor.d".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TodosConfig {
    pub pattern: String,
    pub exclude: Vec<String>,
}

impl Default for TodosConfig {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_TODO_PATTERN.to_string(),
            exclude: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    pub api_base: String,
    pub token: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            token: None,
            timeout_seconds: 15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinksConfig {
    pub repo_url: Option<String>,
    pub branch: String,
    pub docs_dir: String,
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            repo_url: None,
            branch: "main".to_string(),
            docs_dir: "docs".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    pub tools: Vec<String>,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            tools: ["git", "cargo", "rustc", "pre-commit", "task"]
                .iter()
                .map(|t| t.to_string())
                .collect(),
        }
    }
}

impl KitConfig {
    /// Loads the configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(KitError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// Missing file yields the defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.is_file() {
            tracing::debug!("Loading configuration from {}", path.display());
            Self::from_file(path)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content);
        toml::from_str(&processed).map_err(|e| KitError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value (e.g. `${GITHUB_TOKEN}`).
    fn substitute_env_vars(content: &str) -> String {
        static ENV_RE: OnceLock<Regex> = OnceLock::new();
        let re = ENV_RE.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("static regex"));

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    /// Config value, then `GITHUB_TOKEN`, then `GH_TOKEN`.
    pub fn github_token(&self) -> Option<String> {
        let configured = self
            .github
            .token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty() && !t.starts_with("${"))
            .map(str::to_string);

        configured
            .or_else(|| std::env::var("GITHUB_TOKEN").ok())
            .or_else(|| std::env::var("GH_TOKEN").ok())
            .filter(|t| !t.trim().is_empty())
    }

    pub fn resolve(&self, root: &Path, rel: &str) -> PathBuf {
        root.join(rel)
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("github.api_base", &self.github.api_base)?;
        validation::validate_range("github.timeout_seconds", self.github.timeout_seconds, 1, 300)?;

        let paths = [
            ("paths.workflows_dir", &self.paths.workflows_dir),
            ("paths.changelog", &self.paths.changelog),
            ("paths.todo_file", &self.paths.todo_file),
            ("paths.archive_file", &self.paths.archive_file),
            ("paths.labels_dir", &self.paths.labels_dir),
            ("paths.doctor_rules", &self.paths.doctor_rules),
            ("paths.doctor_profiles_dir", &self.paths.doctor_profiles_dir),
            ("links.docs_dir", &self.links.docs_dir),
        ];
        for (field, value) in paths {
            validation::validate_path(field, value)?;
        }

        validation::validate_non_empty_string("todos.pattern", &self.todos.pattern)?;
        validation::validate_non_empty_string("links.branch", &self.links.branch)?;

        if let Some(repo_url) = &self.links.repo_url {
            validation::validate_url("links.repo_url", repo_url)?;
        }

        Ok(())
    }
}

impl Validate for KitConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
