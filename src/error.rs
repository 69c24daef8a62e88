//! Error types for the Suggestion composer
//!
//! Composition itself only fails in three ways (missing config, malformed
//! config, unresolvable owner kind). The remaining variants belong to the
//! outer surfaces: config loading and the CLI.

use std::time::Duration;
use thiserror::Error;

/// Unified error type for the composer
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Composition Errors
    // =========================================================================
    #[error("Suggestion config not found for algorithm: {algorithm}")]
    ConfigNotFound { algorithm: String },

    #[error("Suggestion config parse error: {0}")]
    ConfigParse(String),

    #[error("Failed to set controller reference for {kind}: {reason}")]
    OwnershipBind { kind: String, reason: String },

    // =========================================================================
    // Surface Errors
    // =========================================================================
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Action hint for the reconciler that receives a composer error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorAction {
    /// Requeue with exponential backoff
    RequeueWithBackoff,
    /// Requeue after specific duration
    RequeueAfter(Duration),
    /// Don't requeue, wait for changes
    NoRequeue,
}

impl Error {
    /// Determine what action the caller should take for this error
    pub fn action(&self) -> ErrorAction {
        match self {
            // Transient errors - retry with backoff
            Error::Kube(_) | Error::Io(_) => ErrorAction::RequeueWithBackoff,

            // The config may show up once the operator installs it
            Error::ConfigNotFound { .. } => ErrorAction::RequeueAfter(Duration::from_secs(30)),

            // Nothing changes until someone edits the config or the binary
            Error::ConfigParse(_)
            | Error::OwnershipBind { .. }
            | Error::Configuration(_)
            | Error::JsonParse(_)
            | Error::YamlParse(_) => ErrorAction::NoRequeue,
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        !matches!(self.action(), ErrorAction::NoRequeue)
    }

    /// Check if this error is transient
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Kube(_) | Error::Io(_))
    }
}

/// Result type alias for the composer
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_actions() {
        let err = Error::ConfigNotFound {
            algorithm: "random".into(),
        };
        assert_eq!(
            err.action(),
            ErrorAction::RequeueAfter(Duration::from_secs(30))
        );

        let err = Error::ConfigParse("quantities must match the regular expression".into());
        assert_eq!(err.action(), ErrorAction::NoRequeue);

        let err = Error::OwnershipBind {
            kind: "Suggestion".into(),
            reason: "no kind is registered".into(),
        };
        assert_eq!(err.action(), ErrorAction::NoRequeue);
    }

    #[test]
    fn test_error_retryable() {
        let transient = Error::Io(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            "timed out",
        ));
        assert!(transient.is_retryable());
        assert!(transient.is_transient());

        let missing = Error::ConfigNotFound {
            algorithm: "tpe".into(),
        };
        assert!(missing.is_retryable());
        assert!(!missing.is_transient());

        let config_err = Error::Configuration("invalid".into());
        assert!(!config_err.is_retryable());
        assert!(!config_err.is_transient());
    }

    #[test]
    fn test_error_messages() {
        let err = Error::ConfigNotFound {
            algorithm: "random".into(),
        };
        assert_eq!(
            err.to_string(),
            "Suggestion config not found for algorithm: random"
        );
    }
}
