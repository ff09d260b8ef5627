//! Environment variable secrets.
//!
//! Keys are read once at startup and wrapped in [`SecretString`] so they
//! never reach `Debug` output or logs.

use secrecy::SecretString;

use crate::llm::ANTHROPIC_API_KEY_ENV;
use crate::slack::{SLACK_BOT_TOKEN_ENV, SLACK_SIGNING_SECRET_ENV};

/// Read a secret from the environment.
///
/// Unset, empty, and non-Unicode values all count as missing.
pub fn env_secret(key: &str) -> Option<SecretString> {
    match std::env::var(key) {
        Ok(val) if !val.trim().is_empty() => Some(SecretString::from(val)),
        Ok(_) => None,
        Err(std::env::VarError::NotPresent) => None,
        // Secrets must be valid strings; treat garbage as absent.
        Err(std::env::VarError::NotUnicode(_)) => None,
    }
}

/// Every secret docbot uses.
pub struct EnvSecrets {
    pub anthropic_api_key: Option<SecretString>,
    pub slack_bot_token: Option<SecretString>,
    pub slack_signing_secret: Option<SecretString>,
}

impl EnvSecrets {
    pub fn load() -> Self {
        Self {
            anthropic_api_key: env_secret(ANTHROPIC_API_KEY_ENV),
            slack_bot_token: env_secret(SLACK_BOT_TOKEN_ENV),
            slack_signing_secret: env_secret(SLACK_SIGNING_SECRET_ENV),
        }
    }
}
