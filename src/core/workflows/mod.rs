//! Audit of SHA-pinned `uses:` lines in GitHub Actions workflows.
//!
//! Dependabot bumps the SHA of a pin but leaves the `# vX.Y.Z` comment
//! behind. The auditor resolves each SHA back to its tag, flags comments
//! that drifted, and can rewrite comments or move pins to a newer release.

pub mod pins;
pub mod report;
pub mod resolver;
pub mod rewrite;

pub use pins::{
    classify, normalize_version, parse_comment, repo_slug, scan_dir, versions_equal, PinLine,
    PinnedAction,
};
pub use report::{filter_rows, needs_attention, render_summary, render_table, unique_by_slug};
pub use resolver::{shorten_description, WorkflowAuditor};
pub use rewrite::{rows_needing_comments, update_comments, upgrade_action};
