//! Error types for the chart pipeline.

use thiserror::Error;

/// Result type for chart pipeline operations.
pub type ChartResult<T> = Result<T, ChartError>;

/// Errors that can occur while normalising data or building chart options.
///
/// Structural validation of a finished option is deliberately absent here:
/// [`crate::chart::optimize::validate`] reports it as a `bool`.
#[derive(Debug, Error)]
pub enum ChartError {
    /// The input format tag is not one of the supported formats.
    #[error("Unsupported data type: {tag}")]
    UnsupportedFormat {
        /// The offending tag.
        tag: String,
    },

    /// The chart type tag has no template.
    #[error("Unsupported chart type: {chart_type}")]
    UnsupportedChartType {
        /// The offending chart type.
        chart_type: String,
    },

    /// The input has the wrong shape for the requested operation.
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// Description of what's wrong.
        message: String,
    },

    /// JSON text could not be parsed.
    #[error("Invalid JSON data: {source}")]
    InvalidJson {
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Delimited text or spreadsheet bytes could not be read as a table.
    #[error("Failed to read table: {message}")]
    Table {
        /// Description of what's wrong.
        message: String,
    },

    /// No API key is configured for the LLM endpoint.
    #[error("LLM API key is not configured")]
    MissingCredential,

    /// The LLM endpoint could not be reached or returned a non-success status.
    #[error("LLM API call failed: {message}")]
    UpstreamFailure {
        /// Description of the transport or HTTP failure.
        message: String,
    },

    /// The LLM answered with something that is not a JSON chart option.
    #[error("Chart configuration generation failed: {message}")]
    MalformedResponse {
        /// Description of what's wrong.
        message: String,
    },

    /// The chart document could not be written or opened.
    #[error("Failed to open chart: {message}")]
    Render {
        /// Description of what's wrong.
        message: String,
    },
}

impl ChartError {
    /// Creates an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates a table read error.
    pub fn table(message: impl Into<String>) -> Self {
        Self::Table {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for ChartError {
    fn from(source: serde_json::Error) -> Self {
        Self::InvalidJson { source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_format_names_tag() {
        let err = ChartError::UnsupportedFormat {
            tag: "parquet".to_string(),
        };
        assert!(err.to_string().contains("parquet"));
    }

    #[test]
    fn unsupported_chart_type_names_type() {
        let err = ChartError::UnsupportedChartType {
            chart_type: "radar".to_string(),
        };
        assert!(err.to_string().contains("radar"));
    }

    #[test]
    fn json_error_converts() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: ChartError = source.into();
        assert!(matches!(err, ChartError::InvalidJson { .. }));
    }
}
