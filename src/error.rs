//! Configuration error types.
//!
//! Pipeline and LLM errors live in [`crate::chart::error`]. Neither set ever
//! includes the LLM API key in its messages.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading the configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("failed to read configuration file: {path}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid JSON or has unknown fields.
    #[error("failed to parse configuration file: {path}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// An explicitly requested configuration file does not exist.
    #[error("configuration file not found: {path}")]
    NotFound {
        /// Path that was requested.
        path: PathBuf,
    },

    /// A setting has an unusable value.
    #[error("invalid value for {field}: {message}")]
    ValidationError {
        /// Dotted path of the offending setting, e.g. `data.max_rows`.
        field: &'static str,
        /// Description of the validation failure.
        message: String,
    },
}

impl ConfigError {
    /// Creates a validation error for `field`.
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field,
            message: message.into(),
        }
    }
}
