//! GitCommitLog -- [`CommitLog`] backed by the `git` command line.

use std::path::PathBuf;

use tokio::process::Command;

use docbot_core::vcs::CommitLog;
use docbot_types::error::VcsError;
use docbot_types::vcs::CommitSummary;

/// Reads commit history from a working tree by shelling out to `git log`.
#[derive(Debug, Clone)]
pub struct GitCommitLog {
    repo_root: PathBuf,
}

impl GitCommitLog {
    pub fn new(repo_root: PathBuf) -> Self {
        Self { repo_root }
    }

    pub fn repo_root(&self) -> &PathBuf {
        &self.repo_root
    }
}

impl CommitLog for GitCommitLog {
    async fn recent(&self, days: u32) -> Result<Vec<CommitSummary>, VcsError> {
        let output = Command::new("git")
            .arg("log")
            .arg(format!("--since={days} days ago"))
            .arg("--pretty=format:%h|%s|%ad")
            .arg("--date=short")
            .arg("--name-only")
            .current_dir(&self.repo_root)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| VcsError::Command(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VcsError::Failed(stderr.trim().to_string()));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let commits = parse_git_log(&stdout);
        tracing::debug!(
            days,
            count = commits.len(),
            repo = %self.repo_root.display(),
            "read git log"
        );
        Ok(commits)
    }
}

/// Parse `git log --pretty=format:%h|%s|%ad --name-only` output.
///
/// Each commit is a header line followed by its file names; commits are
/// separated by a blank line.
pub fn parse_git_log(output: &str) -> Vec<CommitSummary> {
    let mut commits: Vec<CommitSummary> = Vec::new();
    let mut expect_header = true;

    for line in output.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            expect_header = true;
            continue;
        }
        if expect_header {
            if let Some(commit) = parse_header(line) {
                commits.push(commit);
                expect_header = false;
            }
            continue;
        }
        if let Some(current) = commits.last_mut() {
            current.files.push(line.to_string());
        }
    }
    commits
}

/// The subject may itself contain `|`, so split on the first and last.
fn parse_header(line: &str) -> Option<CommitSummary> {
    let (hash, rest) = line.split_once('|')?;
    let (subject, date) = rest.rsplit_once('|')?;
    if hash.is_empty() {
        return None;
    }
    Some(CommitSummary {
        hash: hash.to_string(),
        subject: subject.to_string(),
        date: date.to_string(),
        files: Vec::new(),
    })
}
