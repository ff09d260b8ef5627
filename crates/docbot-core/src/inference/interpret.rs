//! Parse a completion into an answer, edits, or a recent-updates request.

use serde_json::Value;

use docbot_types::edit::EditDirective;
use docbot_types::error::InferenceError;
use docbot_types::llm::{CompletionResponse, ToolCall};

use super::prompt::{EDIT_TOOL, RECENT_UPDATES_TOOL};

/// Upper bound on the look-back window the model may ask for.
pub const MAX_RECENT_UPDATES_DAYS: u32 = 90;

/// What the model asked the dispatcher to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interpretation {
    /// Reply with this text.
    Answer(String),
    /// Apply these directives in order.
    Edits(Vec<EditDirective>),
    /// Fetch the commit log for this many days and ask again.
    RecentUpdates { days: u32 },
}

/// Interpret a completion response.
///
/// A response with no tool calls is an answer and must carry non-blank text.
/// Tool calls must all be `edit_file` or all be `get_recent_updates`.
pub fn interpret(
    response: &CompletionResponse,
    default_days: u32,
) -> Result<Interpretation, InferenceError> {
    if response.tool_calls.is_empty() {
        let text = response.content.trim();
        if text.is_empty() {
            return Err(InferenceError::Malformed("empty response".to_string()));
        }
        return Ok(Interpretation::Answer(text.to_string()));
    }

    let mut edits = Vec::new();
    let mut recent: Option<u32> = None;

    for call in &response.tool_calls {
        match call.name.as_str() {
            EDIT_TOOL => edits.push(parse_edit(call)?),
            RECENT_UPDATES_TOOL => {
                let days = parse_days(call, default_days)?;
                recent.get_or_insert(days);
            }
            other => {
                return Err(InferenceError::Malformed(format!("unknown tool '{other}'")));
            }
        }
    }

    match (edits.is_empty(), recent) {
        (false, None) => Ok(Interpretation::Edits(edits)),
        (true, Some(days)) => Ok(Interpretation::RecentUpdates { days }),
        _ => Err(InferenceError::Malformed(
            "edits mixed with a recent-updates request".to_string(),
        )),
    }
}

fn parse_edit(call: &ToolCall) -> Result<EditDirective, InferenceError> {
    let file_path = string_field(call, "file_path")?;
    let search = string_field(call, "find_text")?;
    let replace = string_field(call, "replace_text")?;

    let (project, path) = file_path
        .trim()
        .split_once('/')
        .filter(|(project, path)| !project.is_empty() && !path.is_empty())
        .ok_or_else(|| {
            InferenceError::Malformed(format!(
                "file_path '{file_path}' is not of the form project/path"
            ))
        })?;

    Ok(EditDirective {
        project: project.to_string(),
        path: path.to_string(),
        search: search.to_string(),
        replace: replace.to_string(),
    })
}

fn string_field<'a>(call: &'a ToolCall, field: &str) -> Result<&'a str, InferenceError> {
    call.input
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| {
            InferenceError::Malformed(format!("{} call without string '{field}'", call.name))
        })
}

fn parse_days(call: &ToolCall, default_days: u32) -> Result<u32, InferenceError> {
    match call.input.get("days") {
        None | Some(Value::Null) => Ok(default_days),
        Some(value) => value
            .as_u64()
            .filter(|d| *d > 0)
            .map(|d| u32::try_from(d).unwrap_or(u32::MAX).min(MAX_RECENT_UPDATES_DAYS))
            .ok_or_else(|| InferenceError::Malformed(format!("invalid days value {value}"))),
    }
}
