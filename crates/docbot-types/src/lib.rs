//! Shared domain types for docbot.
//!
//! This crate contains the domain types used across the docbot pipeline:
//! projects and documents, channel sessions, edit directives, inbound
//! messages, LLM request/response shapes, configuration, and error enums.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod edit;
pub mod error;
pub mod llm;
pub mod message;
pub mod project;
pub mod vcs;
