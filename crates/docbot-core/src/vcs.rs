//! Version-control log port and summary rendering.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use docbot_types::error::VcsError;
use docbot_types::vcs::CommitSummary;

/// Supplies recent commits for "what changed" summaries.
pub trait CommitLog: Send + Sync {
    /// Commits from the last `days` days, newest first.
    fn recent(
        &self,
        days: u32,
    ) -> impl std::future::Future<Output = Result<Vec<CommitSummary>, VcsError>> + Send;
}

/// Render commits as a plain-text block for the model to summarize.
pub fn render_commit_log(days: u32, commits: &[CommitSummary]) -> String {
    if commits.is_empty() {
        return format!("No commits found in the last {days} days.");
    }

    let files: BTreeSet<&str> = commits
        .iter()
        .flat_map(|c| c.files.iter().map(String::as_str))
        .collect();

    let mut out = format!("Git history for the last {days} days:\n\n");
    let _ = writeln!(out, "Total commits: {}", commits.len());
    let _ = writeln!(out, "Files modified: {}\n", files.len());
    out.push_str("Commits:\n");
    for commit in commits {
        let _ = writeln!(out, "{} | {} | {}", commit.hash, commit.subject, commit.date);
        for file in &commit.files {
            let _ = writeln!(out, "  {file}");
        }
    }
    out
}
