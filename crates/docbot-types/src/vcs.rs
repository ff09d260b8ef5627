//! Version-control log types used for "what changed recently" summaries.

use serde::{Deserialize, Serialize};

/// One commit from the repository history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSummary {
    /// Abbreviated commit hash.
    pub hash: String,
    pub subject: String,
    /// Commit date as `YYYY-MM-DD`.
    pub date: String,
    /// Paths touched by the commit.
    pub files: Vec<String>,
}
