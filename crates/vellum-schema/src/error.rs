//! Engine error types.

use thiserror::Error;

/// Errors raised by the schema engine.
///
/// Every failure is a deterministic outcome of the input: re-running the same
/// operation with the same input reproduces the same message. The message text
/// is part of the public contract, callers match on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// The specification or update violates a structural rule.
    #[error("{0}")]
    BadRequest(String),
}

impl SchemaError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// The human-readable message, without any prefix.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest(message) => message,
        }
    }
}

/// Errors from the document schema registry.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Requested document schema name was not found in the registry.
    #[error("Document schema not found: {0}")]
    NotFound(String),

    /// JSON value did not pass document schema validation.
    #[error("Validation failed: {errors:?}")]
    ValidationFailed {
        /// Individual error messages from the validator.
        errors: Vec<String>,
    },

    /// Schema generation or compilation error.
    #[error("Schema generation error: {0}")]
    Generation(String),
}

/// Shorthand for `Err(SchemaError::BadRequest(format!(...)))`.
macro_rules! bad_request {
    ($($arg:tt)*) => {
        Err($crate::error::SchemaError::BadRequest(format!($($arg)*)))
    };
}

pub(crate) use bad_request;
