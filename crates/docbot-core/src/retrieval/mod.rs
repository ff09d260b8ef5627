//! Context retrieval: turn the readable corpus into a bounded model context.
//!
//! Scoring is lexical and deterministic. See [`scoring`] for the term
//! extraction and scoring rules and [`engine`] for budget packing.

pub mod engine;
pub mod scoring;

pub use engine::RetrievalEngine;
