//! Per-message request pipeline.
//!
//! `Dispatcher` drives one inbound message through
//! authorize -> retrieve -> infer -> interpret -> answer | edit, updating the
//! channel session and sending exactly one reply. `report` holds the
//! user-facing wording for every outcome.

pub mod dispatcher;
pub mod report;

pub use dispatcher::{DispatchSettings, Dispatcher, PipelineOutcome};
