//! LlmProvider trait definition.
//!
//! This is the inference port the dispatcher calls. Uses RPITIT for
//! `complete`; `BoxLlmProvider` erases the concrete type.

use docbot_types::llm::{CompletionRequest, CompletionResponse, LlmError, ProviderCapabilities};

/// Trait for inference provider backends.
///
/// Implementations live in docbot-infra (e.g., `AnthropicProvider`). Test
/// doubles live next to the dispatcher tests.
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "anthropic").
    fn name(&self) -> &str;

    /// What this provider supports (tool calling, context size).
    fn capabilities(&self) -> &ProviderCapabilities;

    /// Send a completion request and receive the full response.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;
}
