//! System prompt, tool definitions, and request assembly.

use std::fmt::Write as _;

use serde_json::json;

use docbot_types::chat::Turn;
use docbot_types::llm::{CompletionRequest, Message, MessageRole, ToolDefinition};
use docbot_types::project::Excerpt;

/// Tool the model calls to propose a find-and-replace edit.
pub const EDIT_TOOL: &str = "edit_file";

/// Tool the model calls to ask for the recent commit log.
pub const RECENT_UPDATES_TOOL: &str = "get_recent_updates";

const SYSTEM_PROMPT: &str = "\
You are a helpful assistant for project management and documentation.

## What you can do

1. *Answer questions* by searching and summarizing the project files below.
2. *Edit files* with the edit_file tool. Give the exact text to find and the text to replace it with. \
The find text must occur exactly once in the file, so include enough surrounding text to make it unique. \
Call the tool once per change.

## Guidelines
- Be concise and actionable.
- Reference specific documents when you can.
- If the files do not contain the answer, say so clearly.
- Use edit_file whenever you are asked to update, add, or change anything in a project file.

## Memory
You remember the recent conversation in each channel or DM. Memory resets after a period of \
inactivity and only the most recent messages are kept.

## Recent updates
When asked for a weekly update, recent updates, or what's new, call get_recent_updates and \
then summarize the changes by project, highlighting the important ones.

## Formatting
Reply in Slack mrkdwn, not standard markdown:
- Bold: *text* (not **text**)
- Italic: _text_
- Strikethrough: ~text~
- Code: `text` or ```code block```
- Lists: * or - with plain text
- No # headers; use *bold* for emphasis
- Links: <url|text>";

const NO_CONTEXT: &str = "No project files matched this request.";

/// Per-request knobs taken from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSettings {
    pub model: String,
    pub max_tokens: u32,
    /// Look-back advertised as the `get_recent_updates` default.
    pub recent_updates_days: u32,
}

/// `edit_file` tool schema. Files are addressed as `project/relative/path.md`.
pub fn edit_tool() -> ToolDefinition {
    ToolDefinition {
        name: EDIT_TOOL.to_string(),
        description: "Edit a markdown file by replacing one exact occurrence of some text. \
            Use this for any edit: updating todos, adding notes, changing content. \
            find_text must match the file exactly, including whitespace, and must occur once. \
            Call it several times to make several edits."
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Project id followed by the path inside the project, e.g. 'project_alpha/todo.md'"
                },
                "find_text": {
                    "type": "string",
                    "description": "Exact text to find (must match exactly, including whitespace)"
                },
                "replace_text": {
                    "type": "string",
                    "description": "Text to replace it with"
                }
            },
            "required": ["file_path", "find_text", "replace_text"]
        }),
    }
}

/// `get_recent_updates` tool schema.
pub fn recent_updates_tool(default_days: u32) -> ToolDefinition {
    ToolDefinition {
        name: RECENT_UPDATES_TOOL.to_string(),
        description: "Get the git history of project changes from the last N days. \
            Use this for 'weekly update', 'recent updates', 'what's new', or similar."
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "days": {
                    "type": "integer",
                    "description": format!("Number of days to look back (default: {default_days})"),
                    "default": default_days
                }
            },
            "required": []
        }),
    }
}

/// Render excerpts as `## File:` blocks for the system prompt.
pub fn render_context(excerpts: &[Excerpt]) -> String {
    if excerpts.is_empty() {
        return NO_CONTEXT.to_string();
    }
    excerpts
        .iter()
        .map(|e| {
            let mut block = format!("## File: {}/{}", e.project, e.path);
            if e.partial {
                block.push_str(" (matching sections only)");
            }
            let _ = write!(block, "\n\n{}", e.text);
            block
        })
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

/// Assemble the completion request for one user message.
///
/// History turns become conversation messages (leading assistant turns are
/// dropped so the conversation opens with the user). The context goes into
/// the system prompt. `allow_recent_updates` controls whether the model is
/// offered `get_recent_updates`.
pub fn build_request(
    settings: &RequestSettings,
    excerpts: &[Excerpt],
    history: &[Turn],
    user_text: &str,
    allow_recent_updates: bool,
) -> CompletionRequest {
    let mut messages: Vec<Message> = history
        .iter()
        .skip_while(|t| t.role == MessageRole::Assistant)
        .map(|t| Message {
            role: t.role,
            content: t.text.clone(),
        })
        .collect();
    messages.push(Message {
        role: MessageRole::User,
        content: user_text.to_string(),
    });

    let mut tools = vec![edit_tool()];
    if allow_recent_updates {
        tools.push(recent_updates_tool(settings.recent_updates_days));
    }

    CompletionRequest {
        model: settings.model.clone(),
        messages,
        system: Some(format!(
            "{SYSTEM_PROMPT}\n\n# Current project files\n\n{}",
            render_context(excerpts)
        )),
        max_tokens: settings.max_tokens,
        temperature: None,
        tools,
    }
}

/// Attach a fetched commit log to the request's final user message and
/// withdraw the `get_recent_updates` tool for the follow-up call.
pub fn attach_commit_log(request: &mut CompletionRequest, log: &str) {
    request.tools.retain(|t| t.name != RECENT_UPDATES_TOOL);
    let note = format!("\n\n---\n\nRecent repository updates:\n\n{log}");
    match request
        .messages
        .iter_mut()
        .rev()
        .find(|m| m.role == MessageRole::User)
    {
        Some(message) => message.content.push_str(&note),
        None => request.messages.push(Message {
            role: MessageRole::User,
            content: note.trim_start().to_string(),
        }),
    }
}
