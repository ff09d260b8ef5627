//! Inference provider implementations.
//!
//! Contains the Anthropic implementation of the [`LlmProvider`] trait
//! defined in `docbot-core`, a factory ([`create_provider`]) that resolves
//! the API key, and a connection test ([`test_provider_connection`]) used by
//! `docbot check --ping`.
//!
//! [`LlmProvider`]: docbot_core::llm::LlmProvider

pub mod anthropic;

use secrecy::SecretString;

use docbot_core::llm::BoxLlmProvider;
use docbot_types::llm::{CompletionRequest, LlmError, Message, MessageRole};

use self::anthropic::AnthropicProvider;

/// Environment variable holding the Anthropic API key.
pub const ANTHROPIC_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// Build the inference provider for `model`.
///
/// # Errors
///
/// `AuthenticationFailed` when no API key is available.
pub fn create_provider(model: &str, api_key: Option<SecretString>) -> Result<BoxLlmProvider, LlmError> {
    let key = api_key.ok_or(LlmError::AuthenticationFailed)?;
    let provider = AnthropicProvider::new(key, model.to_string())?;
    Ok(BoxLlmProvider::new(provider))
}

/// Send a minimal completion request to verify the key and endpoint.
pub async fn test_provider_connection(provider: &BoxLlmProvider, model: &str) -> Result<(), LlmError> {
    let request = CompletionRequest {
        model: model.to_string(),
        messages: vec![Message {
            role: MessageRole::User,
            content: "Hello".to_string(),
        }],
        system: None,
        max_tokens: 10,
        temperature: Some(0.0),
        tools: Vec::new(),
    };
    provider.complete(&request).await?;
    Ok(())
}
