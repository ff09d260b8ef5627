//! Edit execution: validate and apply literal find-and-replace directives.

pub mod engine;

pub use engine::{EditEngine, count_occurrences};
