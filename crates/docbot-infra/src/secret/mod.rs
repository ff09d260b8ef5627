//! Secret resolution.
//!
//! - `env`: environment variable lookup, the only secret source docbot reads

pub mod env;

pub use env::{EnvSecrets, env_secret};
