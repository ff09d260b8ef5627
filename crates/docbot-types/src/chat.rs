//! Channel session and turn types for docbot.
//!
//! A `Session` is the bounded conversation history of one messaging channel.
//! It holds at most `max_turns` turns (oldest evicted first) and is considered
//! stale once its last activity is older than the inactivity timeout.

use std::collections::VecDeque;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

// Re-export MessageRole from llm module (turns map 1:1 onto LLM messages).
pub use crate::llm::MessageRole;

/// Maximum number of turns a session retains.
pub const MAX_SESSION_TURNS: usize = 20;

/// Inactivity after which a session is replaced by a fresh one (30 minutes).
pub const SESSION_TIMEOUT_SECS: i64 = 30 * 60;

/// Bounds applied to every session: turn cap and inactivity timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPolicy {
    pub max_turns: usize,
    pub timeout: TimeDelta,
}

impl SessionPolicy {
    pub fn new(max_turns: usize, timeout: TimeDelta) -> Self {
        Self {
            max_turns: max_turns.max(1),
            timeout,
        }
    }
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            max_turns: MAX_SESSION_TURNS,
            timeout: TimeDelta::seconds(SESSION_TIMEOUT_SECS),
        }
    }
}

/// One message within a session's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: MessageRole,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// Conversation state for a single channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub channel_id: String,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    turns: VecDeque<Turn>,
}

impl Session {
    /// Create an empty session whose activity clock starts at `now`.
    pub fn new(channel_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            channel_id: channel_id.into(),
            created_at: now,
            last_activity: now,
            turns: VecDeque::new(),
        }
    }

    /// Whether the inactivity window has been exceeded at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>, timeout: TimeDelta) -> bool {
        now - self.last_activity > timeout
    }

    /// Append a turn, refresh last activity, and evict the oldest turns until
    /// at most `max_turns` remain. Returns the number of evicted turns.
    pub fn push_turn(&mut self, turn: Turn, max_turns: usize) -> usize {
        self.last_activity = turn.timestamp;
        self.turns.push_back(turn);

        let mut evicted = 0;
        while self.turns.len() > max_turns {
            self.turns.pop_front();
            evicted += 1;
        }
        evicted
    }

    /// Ordered copy of the turns, oldest first.
    pub fn turns(&self) -> Vec<Turn> {
        self.turns.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
