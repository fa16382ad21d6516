pub mod adapters;
#[cfg(feature = "cli")]
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use app::{AppContext, Gate};
#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{GitHubClient, ProcessGit};
pub use config::KitConfig;
pub use utils::error::{KitError, Result};
