//! Validation errors for user resolution.
//!
//! Every error is a deterministic input-validation failure raised at
//! resolution time. None of them are transient, so none are retryable.

use thiserror::Error;

/// Errors that can occur while resolving a user declaration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Identifier is empty or only whitespace
    #[error("invalid identifier: {identifier:?} must not be empty")]
    InvalidIdentifier {
        /// The rejected identifier, as supplied
        identifier: String,
    },

    /// Identifier was already resolved with different parameters in this run
    #[error("duplicate identifier: user '{identifier}' is already declared with different parameters")]
    DuplicateIdentifier {
        /// The colliding identifier
        identifier: String,
    },

    /// `ensure` is neither `present` nor `absent`
    #[error("invalid ensure value for user '{identifier}': {value:?} (expected \"present\" or \"absent\")")]
    InvalidEnsureValue {
        /// Identifier of the user being resolved
        identifier: String,
        /// The rejected value
        value: String,
    },

    /// `password` was supplied as an empty string
    #[error("invalid password for user '{identifier}': password must not be empty (omit it instead)")]
    InvalidPassword {
        /// Identifier of the user being resolved
        identifier: String,
    },
}

impl ValidationError {
    /// The identifier the failure refers to.
    pub fn identifier(&self) -> &str {
        match self {
            Self::InvalidIdentifier { identifier }
            | Self::DuplicateIdentifier { identifier }
            | Self::InvalidEnsureValue { identifier, .. }
            | Self::InvalidPassword { identifier } => identifier,
        }
    }

    /// Short machine-friendly name of the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidIdentifier { .. } => "invalid_identifier",
            Self::DuplicateIdentifier { .. } => "duplicate_identifier",
            Self::InvalidEnsureValue { .. } => "invalid_ensure_value",
            Self::InvalidPassword { .. } => "invalid_password",
        }
    }

    /// Validation failures are deterministic; retrying never helps.
    pub fn is_retryable(&self) -> bool {
        false
    }
}

/// Result type for resolution operations.
pub type Result<T> = std::result::Result<T, ValidationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_accessor() {
        let err = ValidationError::InvalidEnsureValue {
            identifier: "u".to_string(),
            value: "maybe".to_string(),
        };
        assert_eq!(err.identifier(), "u");
        assert_eq!(err.kind(), "invalid_ensure_value");
    }

    #[test]
    fn test_never_retryable() {
        let errors = [
            ValidationError::InvalidIdentifier {
                identifier: String::new(),
            },
            ValidationError::DuplicateIdentifier {
                identifier: "a".to_string(),
            },
            ValidationError::InvalidPassword {
                identifier: "a".to_string(),
            },
        ];
        assert!(errors.iter().all(|e| !e.is_retryable()));
    }

    #[test]
    fn test_display_mentions_value() {
        let err = ValidationError::InvalidEnsureValue {
            identifier: "u".to_string(),
            value: "maybe".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("\"maybe\""));
        assert!(msg.contains("'u'"));
    }
}
