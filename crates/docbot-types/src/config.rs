//! Configuration types for docbot.
//!
//! `DocbotConfig` represents `docbot.toml`: the project table, an optional
//! shared-docs directory, optional per-channel access restrictions, and
//! pipeline tuning. Everything except `projects` has a sensible default.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::chat::{MAX_SESSION_TURNS, SESSION_TIMEOUT_SECS};

/// Top-level configuration, loaded once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocbotConfig {
    /// Model identifier sent to the inference provider.
    #[serde(default = "default_model")]
    pub model: String,

    /// Maximum output tokens per inference call.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Seconds before an inference call is abandoned.
    #[serde(default = "default_inference_timeout_secs")]
    pub inference_timeout_secs: u64,

    /// Character ceiling for retrieved document context.
    #[serde(default = "default_context_budget_chars")]
    pub context_budget_chars: usize,

    /// Inactivity window after which a channel session is reset.
    #[serde(default = "default_session_timeout_secs")]
    pub session_timeout_secs: i64,

    /// Turn cap per channel session.
    #[serde(default = "default_max_session_turns")]
    pub max_session_turns: usize,

    /// Default look-back window for recent-update summaries.
    #[serde(default = "default_recent_updates_days")]
    pub recent_updates_days: u32,

    /// Repository root for commit history; defaults to the config directory.
    #[serde(default)]
    pub repository_root: Option<PathBuf>,

    #[serde(default)]
    pub projects: Vec<ProjectConfig>,

    /// Top-level documents visible to unrestricted channels only.
    #[serde(default)]
    pub shared_docs: Option<SharedDocsConfig>,

    /// Channel id -> allowed project ids. Channels not listed get full access.
    #[serde(default)]
    pub channel_access: BTreeMap<String, Vec<String>>,
}

impl DocbotConfig {
    /// `session_timeout_secs` as a duration; `None` unless positive and in range.
    pub fn session_timeout(&self) -> Option<TimeDelta> {
        TimeDelta::try_seconds(self.session_timeout_secs).filter(|t| *t > TimeDelta::zero())
    }
}

/// One `[[projects]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub id: String,
    pub name: String,
    /// Root directory; relative paths resolve against the config file's directory.
    pub root: PathBuf,
}

/// Project id under which the `[shared_docs]` directory is served.
pub const SHARED_DOCS_PROJECT_ID: &str = "shared_docs";

/// The `[shared_docs]` table: markdown files directly inside `root`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedDocsConfig {
    /// Relative paths resolve against the config file's directory.
    pub root: PathBuf,

    #[serde(default = "default_shared_docs_name")]
    pub name: String,

    /// File names never served, such as agent instructions.
    #[serde(default = "default_shared_docs_exclude")]
    pub exclude: Vec<String>,
}

fn default_shared_docs_name() -> String {
    "Shared documentation".to_string()
}

fn default_shared_docs_exclude() -> Vec<String> {
    vec!["CLAUDE.md".to_string()]
}

fn default_model() -> String {
    "claude-sonnet-4-5-20250929".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_inference_timeout_secs() -> u64 {
    60
}

fn default_context_budget_chars() -> usize {
    60_000
}

fn default_session_timeout_secs() -> i64 {
    SESSION_TIMEOUT_SECS
}

fn default_max_session_turns() -> usize {
    MAX_SESSION_TURNS
}

fn default_recent_updates_days() -> u32 {
    7
}

impl Default for DocbotConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            max_tokens: default_max_tokens(),
            inference_timeout_secs: default_inference_timeout_secs(),
            context_budget_chars: default_context_budget_chars(),
            session_timeout_secs: default_session_timeout_secs(),
            max_session_turns: default_max_session_turns(),
            recent_updates_days: default_recent_updates_days(),
            repository_root: None,
            projects: Vec::new(),
            shared_docs: None,
            channel_access: BTreeMap::new(),
        }
    }
}
