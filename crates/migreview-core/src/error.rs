//! # Error Types
//!
//! Defines `MigReviewError`, the unified error enum for every failure mode of
//! a review. Parse and schema failures keep the raw model response so the
//! caller can show it as a diagnostic dump instead of re-sending the request.

use std::fmt;

use thiserror::Error;

/// Broad category of a model API failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelErrorKind {
    /// The provider rejected the API key.
    Auth,
    /// Transport failure, connect error, or timeout.
    Network,
    /// Rate limit or quota exhausted.
    Quota,
    Unknown,
}

impl fmt::Display for ModelErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ModelErrorKind::Auth => "auth",
            ModelErrorKind::Network => "network",
            ModelErrorKind::Quota => "quota",
            ModelErrorKind::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// All errors that can occur in migreview operations.
#[derive(Error, Debug)]
pub enum MigReviewError {
    #[error("No Gemini API key provided. migreview looks for a key in this order:\n  1. --api-key flag (review command) or the `key` shell command\n  2. GEMINI_API_KEY environment variable\n  3. .env file with GEMINI_API_KEY")]
    MissingCredential,

    #[error("No {field} provided. Both the current schema and the planned DDL are required")]
    MissingInput { field: &'static str },

    #[error("Gemini API error ({kind}): {message}")]
    Model {
        kind: ModelErrorKind,
        message: String,
    },

    #[error("Failed to parse model response as JSON: {message}")]
    Parse { message: String, raw: String },

    #[error("Model response does not match the review format: {message}")]
    Schema { message: String, raw: String },

    #[error("Review cancelled before the model answered")]
    Cancelled,

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Input error: {message}")]
    Input {
        message: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Other(String),
}

impl MigReviewError {
    pub(crate) fn model(kind: ModelErrorKind, message: impl Into<String>) -> Self {
        MigReviewError::Model {
            kind,
            message: message.into(),
        }
    }

    /// The unmodified model response attached to parse and schema failures.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            MigReviewError::Parse { raw, .. } | MigReviewError::Schema { raw, .. } => Some(raw),
            _ => None,
        }
    }

    /// Kind of a model API failure, if this is one.
    pub fn model_kind(&self) -> Option<ModelErrorKind> {
        match self {
            MigReviewError::Model { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, MigReviewError>;
