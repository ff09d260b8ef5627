//! Version-control adapters.

pub mod git;

pub use git::GitCommitLog;
