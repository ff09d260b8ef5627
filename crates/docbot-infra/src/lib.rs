//! Infrastructure layer for docbot.
//!
//! Contains implementations of the ports defined in `docbot-core`: the
//! filesystem document store, the Anthropic inference provider, the Slack
//! transport and request verification, the git commit log, and
//! configuration loading.

pub mod config;
pub mod filesystem;
pub mod llm;
pub mod secret;
pub mod slack;
pub mod vcs;
