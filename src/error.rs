//! Error types for the enhancement-recommender library.
//!
//! This module provides custom error types using `thiserror` for better error handling
//! and more specific error messages throughout the data pipeline and the remote
//! resource workflow.

use aws_sdk_personalize::error::{DisplayErrorContext, ProvideErrorMetadata};
use thiserror::Error;

/// Error code the recommendation service returns when a named resource already exists.
pub const ALREADY_EXISTS_CODE: &str = "ResourceAlreadyExistsException";

/// Error code the recommendation service returns for an unknown ARN.
pub const NOT_FOUND_CODE: &str = "ResourceNotFoundException";

/// Errors that can occur in the enhancement-recommender application.
#[derive(Error, Debug)]
pub enum RecommenderError {
    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reading or writing errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A required column is absent from the raw extract
    #[error("Missing column in input: {0}")]
    MissingColumn(String),

    /// Invalid date or timestamp value
    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    /// Invalid user input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Error returned by a remote API call
    #[error("{operation} failed with {code}: {message}")]
    Api {
        /// Name of the remote operation
        operation: String,
        /// Service error code, or `Unknown` for transport failures
        code: String,
        /// Human readable detail
        message: String,
    },

    /// A successful response lacked a field the workflow depends on
    #[error("{operation} response is missing {field}")]
    MissingField {
        /// Name of the remote operation
        operation: String,
        /// Field that was expected
        field: String,
    },

    /// A polled resource settled on a failure status
    #[error("{resource} {arn} ended in status {status}")]
    ResourceFailed {
        /// Resource kind
        resource: String,
        /// Resource identifier
        arn: String,
        /// Terminal failure status
        status: String,
    },

    /// A polled resource did not settle before the wall-clock limit
    #[error("Timed out after {waited_secs}s waiting for {resource} {arn} (last status {last_status})")]
    Timeout {
        /// Resource kind
        resource: String,
        /// Resource identifier
        arn: String,
        /// Seconds spent polling
        waited_secs: u64,
        /// Last observed status
        last_status: String,
    },
}

impl RecommenderError {
    /// Build an API error from its parts.
    pub fn api(operation: &str, code: Option<&str>, message: impl Into<String>) -> Self {
        Self::Api {
            operation: operation.to_string(),
            code: code.unwrap_or("Unknown").to_string(),
            message: message.into(),
        }
    }

    /// Build a missing-field error for a response.
    pub fn missing(operation: &str, field: &str) -> Self {
        Self::MissingField {
            operation: operation.to_string(),
            field: field.to_string(),
        }
    }

    /// Remote error code, if this is an API error.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => Some(code),
            _ => None,
        }
    }

    /// True when the remote service rejected a create because the name is taken.
    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        self.code() == Some(ALREADY_EXISTS_CODE)
    }

    /// True when the remote service does not know the resource.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.code() == Some(NOT_FOUND_CODE)
    }
}

/// Convert an AWS SDK failure, keeping the service error code when there is one.
pub(crate) fn sdk_error<E>(operation: &str, err: &E) -> RecommenderError
where
    E: ProvideErrorMetadata + std::error::Error,
{
    let message = err
        .message()
        .map_or_else(|| DisplayErrorContext(err).to_string(), str::to_string);
    RecommenderError::api(operation, err.code(), message)
}

/// Convenience type alias for Result with `RecommenderError`
pub type Result<T> = std::result::Result<T, RecommenderError>;
