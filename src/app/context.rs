use crate::adapters::ProcessGit;
use crate::config::cli::CliConfig;
use crate::config::toml_config::{KitConfig, DEFAULT_CONFIG_FILE};
use crate::domain::ports::GitClient;
use crate::utils::colors::Palette;
use crate::utils::error::{KitError, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Everything a command needs besides its own arguments.
#[derive(Clone)]
pub struct AppContext {
    pub root: PathBuf,
    pub config: KitConfig,
    pub palette: Palette,
    pub git: Arc<dyn GitClient>,
}

impl AppContext {
    pub fn new(root: PathBuf, config: KitConfig, palette: Palette) -> Self {
        Self {
            root,
            config,
            palette,
            git: Arc::new(ProcessGit::new()),
        }
    }

    pub fn with_git(mut self, git: Arc<dyn GitClient>) -> Self {
        self.git = git;
        self
    }

    /// Root from `--root`, else the git toplevel, else the current directory.
    /// An explicit `--config` must exist; the default one may be absent.
    pub fn from_cli(cli: &CliConfig) -> Result<Self> {
        let git = ProcessGit::new();
        let root = match &cli.root {
            Some(root) => root.clone(),
            None => {
                let cwd = std::env::current_dir()?;
                git.toplevel(&cwd).unwrap_or(cwd)
            }
        };
        if !root.is_dir() {
            return Err(KitError::not_found(root.display()));
        }

        let config = match &cli.config {
            Some(path) if !path.is_file() => return Err(KitError::not_found(path.display())),
            Some(path) => KitConfig::from_file(path)?,
            None => KitConfig::load_or_default(root.join(DEFAULT_CONFIG_FILE))?,
        };

        tracing::debug!("Repository root: {}", root.display());
        Ok(Self::new(root, config, Palette::new(cli.color_override())))
    }

    /// A configured path, resolved against the root.
    pub fn path(&self, rel: &str) -> PathBuf {
        self.config.resolve(&self.root, rel)
    }

    pub fn root_name(&self) -> String {
        self.root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.root.display().to_string())
    }

    pub fn relative<'p>(&self, path: &'p Path) -> &'p Path {
        path.strip_prefix(&self.root).unwrap_or(path)
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("root", &self.root)
            .field("config", &self.config)
            .field("palette", &self.palette)
            .finish_non_exhaustive()
    }
}
