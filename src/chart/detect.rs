//! Input format detection.
//!
//! Detection is a best-effort heuristic, not a grammar. Text that looks like
//! JSON (starts with `{`) is routed to the JSON path even when it does not
//! parse, so the JSON parser reports the failure instead of the CSV reader
//! producing a nonsense table.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::chart::error::ChartError;

/// Supported input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatTag {
    /// A key-value mapping supplied directly.
    StructuredMapping,
    /// JSON text (or an already-parsed JSON value).
    JsonText,
    /// Delimited text with a header row.
    DelimitedText,
    /// Spreadsheet workbook bytes. Never detected, only requested explicitly.
    Spreadsheet,
}

impl FormatTag {
    /// Returns the canonical tool-surface name for this format.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StructuredMapping => "dict",
            Self::JsonText => "json",
            Self::DelimitedText => "csv",
            Self::Spreadsheet => "excel",
        }
    }
}

impl fmt::Display for FormatTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormatTag {
    type Err = ChartError;

    /// Parses a caller-supplied tag.
    ///
    /// Accepts the short names (`dict`, `json`, `csv`, `excel`) and the long
    /// names (`structured-mapping`, `json-text`, `delimited-text`,
    /// `spreadsheet`), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dict" | "structured-mapping" => Ok(Self::StructuredMapping),
            "json" | "json-text" => Ok(Self::JsonText),
            "csv" | "delimited-text" => Ok(Self::DelimitedText),
            "excel" | "xlsx" | "spreadsheet" => Ok(Self::Spreadsheet),
            _ => Err(ChartError::UnsupportedFormat { tag: s.to_string() }),
        }
    }
}

/// Decides the format of `raw` when the caller did not say.
#[must_use]
pub fn detect(raw: &Value) -> FormatTag {
    match raw {
        Value::Object(_) => FormatTag::StructuredMapping,
        Value::String(text) => {
            if serde_json::from_str::<Value>(text).is_ok() || text.trim().starts_with('{') {
                FormatTag::JsonText
            } else {
                FormatTag::DelimitedText
            }
        }
        _ => FormatTag::StructuredMapping,
    }
}
