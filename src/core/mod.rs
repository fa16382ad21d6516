pub mod archive;
pub mod changelog;
pub mod clean;
pub mod diagnostics;
pub mod labels;
pub mod links;
pub mod nul_bytes;
pub mod repo_doctor;
pub mod todos;
pub mod workflows;

pub use crate::domain::model::{ActionRow, Label, Level, RowFilter, Staleness};
pub use crate::domain::ports::{GitClient, GitHubApi};
pub use crate::utils::error::Result;
pub use changelog::DriftReport;
pub use links::{rewrite_repo_links, LinkRewriter};
pub use todos::{find_todos, TodoReport};
pub use workflows::WorkflowAuditor;
