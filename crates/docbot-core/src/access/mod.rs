//! Channel-to-project access control.

pub mod gate;

pub use gate::{AccessGate, mentioned_projects};
