//! User-facing reply text.
//!
//! Replies name the failure category and nothing else: no error chains,
//! paths on disk, or provider messages reach the channel.

use std::fmt::Write as _;

use docbot_types::edit::EditReport;
use docbot_types::error::{AccessError, EditRejection, InferenceError};

/// Reply to a mention with no question in it.
pub const GREETING: &str = "Hi! Ask me anything about your project.";

pub fn refusal(error: &AccessError) -> String {
    match error {
        AccessError::AccessDenied { requested, .. } => format!(
            "Sorry, this channel doesn't have access to {}.",
            requested.join(", ")
        ),
    }
}

pub fn inference_failure(error: &InferenceError) -> String {
    match error {
        InferenceError::Timeout(_) => {
            "Sorry, the assistant took too long to respond. Please try again.".to_string()
        }
        InferenceError::Malformed(_) => {
            "Sorry, I couldn't make sense of the assistant's response. Please try rephrasing."
                .to_string()
        }
        InferenceError::Provider(_) => {
            "Sorry, the assistant is unavailable right now. Please try again shortly.".to_string()
        }
    }
}

pub fn invalid_channel() -> String {
    "Sorry, I couldn't tell which conversation this message belongs to.".to_string()
}

/// Short reason for a rejected edit, safe to show in the channel.
pub fn rejection_reason(rejection: &EditRejection) -> String {
    match rejection {
        EditRejection::FileNotFound(_) => "the file does not exist".to_string(),
        EditRejection::NoMatch(_) => "the text to replace was not found".to_string(),
        EditRejection::AmbiguousMatch { count, .. } => {
            format!("the text to replace appears {count} times, so the edit is ambiguous")
        }
        EditRejection::UnknownProject(_) => "there is no such project".to_string(),
        EditRejection::InvalidDirective(_) => "the edit request was invalid".to_string(),
        EditRejection::AccessDenied(_) => {
            "this channel doesn't have access to that project".to_string()
        }
        EditRejection::Io(_) => "the file could not be written".to_string(),
    }
}

/// Summarize an edit batch: what was applied, what failed, what was skipped.
pub fn edit_summary(report: &EditReport) -> String {
    let mut out = String::new();

    if !report.applied.is_empty() {
        let noun = if report.applied.len() == 1 { "edit" } else { "edits" };
        let _ = writeln!(out, "Applied {} {noun}:", report.applied.len());
        for target in &report.applied {
            let _ = writeln!(out, "• `{target}`");
        }
    }

    if let Some((target, rejection)) = &report.failed {
        if !out.is_empty() {
            out.push('\n');
        }
        let _ = writeln!(out, "Could not edit `{target}`: {}.", rejection_reason(rejection));
        if report.skipped > 0 {
            let noun = if report.skipped == 1 { "edit was" } else { "edits were" };
            let _ = writeln!(out, "{} remaining {noun} not attempted.", report.skipped);
        }
    }

    if out.is_empty() {
        out.push_str("No edits were requested.");
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use docbot_types::llm::LlmError;
    use std::time::Duration;

    #[test]
    fn summary_of_successful_batch() {
        let report = EditReport {
            applied: vec!["alpha/roadmap.md".to_string()],
            failed: None,
            skipped: 0,
        };
        assert_eq!(edit_summary(&report), "Applied 1 edit:\n• `alpha/roadmap.md`");
    }

    #[test]
    fn summary_of_partial_batch() {
        let report = EditReport {
            applied: vec!["alpha/a.md".to_string()],
            failed: Some((
                "alpha/b.md".to_string(),
                EditRejection::NoMatch("alpha/b.md".to_string()),
            )),
            skipped: 2,
        };
        let text = edit_summary(&report);
        assert!(text.starts_with("Applied 1 edit:\n• `alpha/a.md`\n\n"));
        assert!(text.contains("Could not edit `alpha/b.md`: the text to replace was not found."));
        assert!(text.ends_with("2 remaining edits were not attempted."));
    }

    #[test]
    fn failure_messages_hide_details() {
        let err = InferenceError::Provider(LlmError::Provider {
            message: "HTTP 500: stack trace at /srv/app".to_string(),
        });
        assert!(!inference_failure(&err).contains("/srv"));
        let err = InferenceError::Timeout(Duration::from_secs(60));
        assert!(inference_failure(&err).contains("too long"));

        let rejection = EditRejection::Io("EACCES /home/bot/docs/a.md".to_string());
        assert!(!rejection_reason(&rejection).contains("/home"));
    }

    #[test]
    fn refusal_names_requested_projects() {
        let err = AccessError::AccessDenied {
            channel: "C1".to_string(),
            requested: vec!["beta".to_string()],
            allowed: vec!["alpha".to_string()],
        };
        assert_eq!(refusal(&err), "Sorry, this channel doesn't have access to beta.");
    }
}
