use std::time::Duration;

use thiserror::Error;

use crate::llm::LlmError;

/// Errors related to channel session operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("invalid channel identifier")]
    InvalidChannel,
}

/// Errors from the access gate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("channel '{channel}' may not access {}", requested.join(", "))]
    AccessDenied {
        channel: String,
        requested: Vec<String>,
        allowed: Vec<String>,
    },
}

/// Reasons an edit directive is rejected. A rejected directive never
/// changes the target file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditRejection {
    #[error("file '{0}' does not exist")]
    FileNotFound(String),

    #[error("search text not found in '{0}'")]
    NoMatch(String),

    #[error("search text matches {count} locations in '{path}'")]
    AmbiguousMatch { path: String, count: usize },

    #[error("unknown project '{0}'")]
    UnknownProject(String),

    #[error("invalid directive: {0}")]
    InvalidDirective(String),

    #[error("access denied to project '{0}'")]
    AccessDenied(String),

    #[error("i/o error: {0}")]
    Io(String),
}

/// Errors from document store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("document not found: {0}")]
    NotFound(String),

    #[error("unknown project '{0}'")]
    UnknownProject(String),

    #[error("invalid document path: {0}")]
    InvalidPath(String),

    #[error("i/o error: {0}")]
    Io(String),
}

impl From<StoreError> for EditRejection {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(path) => EditRejection::FileNotFound(path),
            StoreError::UnknownProject(project) => EditRejection::UnknownProject(project),
            StoreError::InvalidPath(msg) => EditRejection::InvalidDirective(msg),
            StoreError::Io(msg) => EditRejection::Io(msg),
        }
    }
}

/// Errors from calling or interpreting the inference service.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("inference timed out after {0:?}")]
    Timeout(Duration),

    #[error("malformed inference output: {0}")]
    Malformed(String),

    #[error(transparent)]
    Provider(#[from] LlmError),
}

/// Errors from sending an outbound message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("send failed: {0}")]
    Send(String),

    #[error("platform rejected message: {0}")]
    Rejected(String),
}

/// Errors from reading the version-control log.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VcsError {
    #[error("failed to run git: {0}")]
    Command(String),

    #[error("git exited with an error: {0}")]
    Failed(String),
}

/// Errors from loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {message}")]
    Read { path: String, message: String },

    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_denied_display() {
        let err = AccessError::AccessDenied {
            channel: "C1".to_string(),
            requested: vec!["beta".to_string(), "gamma".to_string()],
            allowed: vec!["alpha".to_string()],
        };
        assert_eq!(err.to_string(), "channel 'C1' may not access beta, gamma");
    }

    #[test]
    fn test_store_error_maps_to_rejection() {
        assert_eq!(
            EditRejection::from(StoreError::NotFound("a/x.md".to_string())),
            EditRejection::FileNotFound("a/x.md".to_string())
        );
        assert_eq!(
            EditRejection::from(StoreError::InvalidPath("../x".to_string())),
            EditRejection::InvalidDirective("../x".to_string())
        );
    }

    #[test]
    fn test_inference_error_wraps_provider() {
        let err: InferenceError = LlmError::AuthenticationFailed.into();
        assert_eq!(err.to_string(), "authentication failed");
    }

    #[test]
    fn test_ambiguous_match_display() {
        let err = EditRejection::AmbiguousMatch {
            path: "alpha/todo.md".to_string(),
            count: 3,
        };
        assert!(err.to_string().contains('3'));
        assert!(err.to_string().contains("alpha/todo.md"));
    }
}
