//! Inference request construction and response interpretation.
//!
//! `prompt` turns retrieved context and session history into a
//! `CompletionRequest`; `interpret` turns the provider's response into an
//! `Interpretation` the dispatcher can route. Anything that does not parse
//! cleanly is `InferenceError::Malformed`, never a guess.

pub mod interpret;
pub mod prompt;

pub use interpret::{Interpretation, interpret};
pub use prompt::{RequestSettings, build_request};
