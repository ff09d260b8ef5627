//! Anthropic Claude provider implementation.
//!
//! This module provides the [`AnthropicProvider`] which implements the
//! [`LlmProvider`](docbot_core::llm::LlmProvider) trait for the Anthropic
//! Messages API, including tool use.

pub mod client;
pub mod types;

pub use client::AnthropicProvider;
