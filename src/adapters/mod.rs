// Adapters layer: concrete implementations of the domain ports.

pub mod git;
pub mod github;

pub use git::ProcessGit;
pub use github::GitHubClient;
