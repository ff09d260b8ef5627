//! Edit directive types.
//!
//! An `EditDirective` describes one literal find-and-replace edit to one
//! document. It is produced by interpreting an inference result and consumed
//! exactly once by the edit engine.

use serde::{Deserialize, Serialize};

use crate::error::EditRejection;

/// One literal find-and-replace edit to one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditDirective {
    pub project: String,
    /// Path relative to the project root.
    pub path: String,
    pub search: String,
    pub replace: String,
}

impl EditDirective {
    /// `project/path`, the form users and the model refer to files by.
    pub fn target(&self) -> String {
        format!("{}/{}", self.project, self.path)
    }
}

/// Outcome of applying an ordered batch of directives.
///
/// Application stops at the first failure; `skipped` counts the directives
/// after it that were never attempted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditReport {
    pub applied: Vec<String>,
    pub failed: Option<(String, EditRejection)>,
    pub skipped: usize,
}

impl EditReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_joins_project_and_path() {
        let directive = EditDirective {
            project: "alpha".to_string(),
            path: "docs/roadmap.md".to_string(),
            search: "a".to_string(),
            replace: "b".to_string(),
        };
        assert_eq!(directive.target(), "alpha/docs/roadmap.md");
    }

    #[test]
    fn test_report_success() {
        let mut report = EditReport::default();
        assert!(report.is_success());
        report.failed = Some(("alpha/x.md".to_string(), EditRejection::NoMatch("alpha/x.md".to_string())));
        assert!(!report.is_success());
    }
}
