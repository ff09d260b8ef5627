//! Request-handling pipeline and port trait definitions for docbot.
//!
//! This crate holds the stateful core: the per-channel session manager, the
//! access gate, context retrieval, the edit engine, inference interpretation,
//! and the dispatcher that ties them together. It defines the "ports"
//! (`DocumentStore`, `LlmProvider`, `MessageTransport`, `CommitLog`) that the
//! infrastructure layer implements, and depends only on `docbot-types` --
//! never on `docbot-infra` or any network/filesystem crate.

pub mod access;
pub mod dispatch;
pub mod edit;
pub mod inference;
pub mod llm;
pub mod retrieval;
pub mod session;
pub mod store;
pub mod transport;
pub mod vcs;

#[cfg(test)]
pub(crate) mod testing;
