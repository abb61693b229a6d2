//! Error types for Mindwell
//!
//! This module defines the crate-wide error type, using `thiserror` for
//! ergonomic error handling. Completion-specific failures live in
//! [`crate::completion::CompletionError`]; HTTP status mapping lives in
//! [`crate::server::error`].

use thiserror::Error;

/// A single field-level validation failure
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FieldError {
    /// Name of the offending input field (wire name, e.g. `mood`)
    pub field: String,
    /// Human readable reason
    pub message: String,
}

impl FieldError {
    /// Creates a new field error
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Main error type for Mindwell operations
#[derive(Error, Debug)]
pub enum MindwellError {
    /// Configuration-related errors, including missing credentials
    #[error("Configuration error: {0}")]
    Config(String),

    /// Caller input failed validation
    #[error("Validation failed: {}", join_fields(.0))]
    Validation(Vec<FieldError>),

    /// Document store errors (open, write, read, decode)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Completion endpoint errors that could not be recovered locally
    #[error("Completion error: {0}")]
    Completion(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl MindwellError {
    /// Shorthand for a validation error on a single field
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldError::new(field, message)])
    }
}

fn join_fields(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias for Mindwell operations
///
/// Uses `anyhow::Error` so callers can attach context; typed errors are
/// recovered with `downcast_ref::<MindwellError>()` where the variant matters.
pub type Result<T> = anyhow::Result<T>;
