//! Per-channel conversation sessions.
//!
//! `SessionManager` owns every channel's `Session` behind its own async
//! mutex, so work on one channel is serialized while channels proceed
//! independently.

pub mod manager;

pub use manager::{ChannelSession, SessionManager};
