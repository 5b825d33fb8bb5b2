//! Policy error types.

use thiserror::Error;

/// Main error type for policy configuration and serialization.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("directive `{name}` is already registered for this policy")]
    DuplicateDirective { name: String },

    #[error("a policy for header `{header}` is already registered")]
    DuplicatePolicy { header: String },

    #[error("policy is sealed and can no longer be modified")]
    BuilderSealed,

    #[error("unsupported hash algorithm: {name}")]
    UnsupportedAlgorithm { name: String },

    #[error("invalid source value: {reason}")]
    InvalidSource { reason: String },
}

pub type PolicyResult<T> = Result<T, PolicyError>;

impl PolicyError {
    pub fn duplicate_directive(name: impl Into<String>) -> Self {
        Self::DuplicateDirective { name: name.into() }
    }

    pub fn duplicate_policy(header: impl Into<String>) -> Self {
        Self::DuplicatePolicy {
            header: header.into(),
        }
    }

    pub fn unsupported_algorithm(name: impl Into<String>) -> Self {
        Self::UnsupportedAlgorithm { name: name.into() }
    }

    pub fn invalid_source(reason: impl Into<String>) -> Self {
        Self::InvalidSource {
            reason: reason.into(),
        }
    }
}
