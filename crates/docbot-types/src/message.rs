//! Inbound message events and pipeline states.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A message delivered by the messaging transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub channel_id: String,
    pub author_id: String,
    pub text: String,
    #[serde(default)]
    pub is_direct_message: bool,
}

/// States of the per-message request pipeline.
///
/// `Refused`, `Failed`, `Answered`, `Edited`, and `EditFailed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Received,
    Authorizing,
    Retrieving,
    Inferring,
    Interpreting,
    Editing,
    Refused,
    Failed,
    Answered,
    Edited,
    EditFailed,
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PipelineState::Refused
                | PipelineState::Failed
                | PipelineState::Answered
                | PipelineState::Edited
                | PipelineState::EditFailed
        )
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PipelineState::Received => "received",
            PipelineState::Authorizing => "authorizing",
            PipelineState::Retrieving => "retrieving",
            PipelineState::Inferring => "inferring",
            PipelineState::Interpreting => "interpreting",
            PipelineState::Editing => "editing",
            PipelineState::Refused => "refused",
            PipelineState::Failed => "failed",
            PipelineState::Answered => "answered",
            PipelineState::Edited => "edited",
            PipelineState::EditFailed => "edit_failed",
        };
        write!(f, "{s}")
    }
}
