//! Slack adapters: Events API parsing, request signing, and the
//! `chat.postMessage` transport.

pub mod client;
pub mod events;
pub mod verify;

pub use client::SlackTransport;
pub use events::{EventAction, SlackEnvelope, SlackEvent, classify};
pub use verify::{SignatureError, verify_slack_signature};

/// Environment variable holding the bot's OAuth token (`xoxb-...`).
pub const SLACK_BOT_TOKEN_ENV: &str = "SLACK_BOT_TOKEN";

/// Environment variable holding the app's signing secret.
pub const SLACK_SIGNING_SECRET_ENV: &str = "SLACK_SIGNING_SECRET";
