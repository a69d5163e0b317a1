//! Error types for Cachelab core operations.

use thiserror::Error;

/// The main error type for Cachelab core operations.
///
/// None of these escape a cache decision: a client validator that cannot be
/// interpreted is answered with a fresh representation instead.
#[derive(Debug, Error)]
pub enum Error {
    /// A client-supplied validator could not be parsed or compared.
    #[error("malformed validator in {header}: '{value}'")]
    MalformedValidator {
        /// The request header the validator came from.
        header: &'static str,
        /// The raw value supplied by the client.
        value: String,
    },

    /// The resource could not be loaded.
    #[error("resource unavailable: {0}")]
    ResourceUnavailable(String),

    /// The provided input was invalid.
    #[error("invalid input: {field} - {message}")]
    InvalidInput {
        /// The field that was invalid.
        field: &'static str,
        /// A description of why the input was invalid.
        message: String,
    },
}

/// A specialized Result type for Cachelab operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Creates a new malformed validator error.
    #[must_use]
    pub fn malformed_validator(header: &'static str, value: impl Into<String>) -> Self {
        Self::MalformedValidator {
            header,
            value: value.into(),
        }
    }

    /// Creates a new invalid input error.
    #[must_use]
    pub fn invalid_input(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            message: message.into(),
        }
    }

    /// Returns true if the caller may retry the operation later.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ResourceUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn error_malformed_validator_display() {
        let err = Error::malformed_validator("if-modified-since", "yesterday");
        assert_eq!(
            err.to_string(),
            "malformed validator in if-modified-since: 'yesterday'"
        );
    }

    #[test]
    fn error_invalid_input_display() {
        let err = Error::invalid_input("max_age_seconds", "must be positive");
        assert_eq!(
            err.to_string(),
            "invalid input: max_age_seconds - must be positive"
        );
    }

    #[test]
    fn only_unavailable_is_retryable() {
        assert!(Error::ResourceUnavailable("loading".into()).is_retryable());
        assert!(!Error::malformed_validator("if-none-match", "x").is_retryable());
    }
}
