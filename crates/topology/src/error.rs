//! Error types for topology operations.
//!
//! Errors are categorized so callers can tell a broken persisted document
//! apart from a rejected request or an unreachable host.

use std::path::PathBuf;
use thiserror::Error;

/// Broad categories of topology errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed or inconsistent topology, or a violated mutation invariant
    Config,
    /// One or more proposed addresses were rejected
    Validation,
    /// Persisted state missing or unreadable
    Access,
    /// A node could not be reached over the remote-execution channel
    Connectivity,
    /// The request itself was unusable
    InvalidArgument,
}

impl ErrorCategory {
    /// Get a user-friendly description of this error category.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Config => "Configuration error",
            Self::Validation => "Validation failed",
            Self::Access => "Cannot access cluster state",
            Self::Connectivity => "Node unreachable",
            Self::InvalidArgument => "Invalid arguments",
        }
    }

    /// Get actionable advice for resolving this error category.
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Config => "Inspect the topology file and fix the reported inconsistency",
            Self::Validation => "Fix every listed address and run the command again",
            Self::Access => "Check that the HA directory exists and is readable",
            Self::Connectivity => "Verify SSH user, key and network access to the node",
            Self::InvalidArgument => "Pass at least one role with node addresses",
        }
    }
}

/// Errors that can occur while loading, validating or mutating a topology.
#[derive(Debug, Error)]
pub enum Error {
    /// The topology is malformed or a mutation would break its invariants
    #[error("config error: {message}")]
    Config {
        /// What is inconsistent
        message: String,
    },

    /// Address validation failed.
    ///
    /// Only the first message is shown in the error text; `errors` keeps the
    /// full list for display.
    #[error("IP address validation failed: {first}")]
    Validation {
        /// Representative error
        first: String,
        /// Every validation error, in discovery order
        errors: Vec<String>,
    },

    /// Persisted state is missing or unreadable
    #[error("cannot access {}: {source}", path.display())]
    Access {
        /// Path of the persisted document
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Reachability probe failure
    #[error("cannot reach {address}: {message}")]
    Connectivity {
        /// Target address
        address: String,
        /// Transport error detail
        message: String,
    },

    /// Invalid request arguments
    #[error("invalid arguments: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Wrap a list of validation messages, keeping the first as representative.
    ///
    /// Returns `None` when the list is empty.
    pub fn validation(errors: Vec<String>) -> Option<Self> {
        let first = errors.first()?.clone();
        Some(Self::Validation { first, errors })
    }

    /// Get the category of this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Config { .. } => ErrorCategory::Config,
            Self::Validation { .. } => ErrorCategory::Validation,
            Self::Access { .. } => ErrorCategory::Access,
            Self::Connectivity { .. } => ErrorCategory::Connectivity,
            Self::InvalidArgument(_) => ErrorCategory::InvalidArgument,
        }
    }

    /// Every message carried by this error (the full list for validation errors)
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::Validation { errors, .. } => errors.clone(),
            other => vec![other.to_string()],
        }
    }
}

/// Result type alias for topology operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_keeps_first_and_all() {
        let err = Error::validation(vec!["first".into(), "second".into()]).unwrap();
        assert_eq!(err.to_string(), "IP address validation failed: first");
        assert_eq!(err.messages().len(), 2);
        assert_eq!(err.category(), ErrorCategory::Validation);
    }

    #[test]
    fn test_validation_empty_is_none() {
        assert!(Error::validation(Vec::new()).is_none());
    }

    #[test]
    fn test_access_error_display() {
        let err = Error::Access {
            path: PathBuf::from("/tmp/missing.toml"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert!(err.to_string().contains("/tmp/missing.toml"));
        assert_eq!(err.category(), ErrorCategory::Access);
    }
}
