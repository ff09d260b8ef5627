//! HTTP layer for docbot.
//!
//! Axum router serving the Slack Events API endpoint and a liveness probe.

pub mod error;
pub mod handlers;
pub mod router;
