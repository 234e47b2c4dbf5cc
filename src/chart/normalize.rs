//! Format normalisation.
//!
//! Converts each supported input format into either canonical
//! `{xAxis, series}` data or an opaque JSON mapping that is passed through.

use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use serde_json::Value;
use tracing::debug;

use crate::chart::data::NormalizedData;
use crate::chart::detect::{detect, FormatTag};
use crate::chart::error::{ChartError, ChartResult};
use crate::chart::table::Table;

/// Default cap on ingested rows.
pub const DEFAULT_MAX_ROWS: usize = 10_000;

/// Converts raw input into normalised chart data.
#[derive(Debug, Clone)]
pub struct Normalizer {
    max_rows: usize,
    allowed_paths: Vec<PathBuf>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ROWS)
    }
}

impl Normalizer {
    /// Creates a normaliser with the given row cap and no path restrictions.
    #[must_use]
    pub const fn new(max_rows: usize) -> Self {
        Self {
            max_rows,
            allowed_paths: Vec::new(),
        }
    }

    /// Restricts spreadsheet file reads to the given directories.
    #[must_use]
    pub fn with_allowed_paths(mut self, allowed_paths: Vec<PathBuf>) -> Self {
        self.allowed_paths = allowed_paths;
        self
    }

    /// Returns the row cap.
    #[must_use]
    pub const fn max_rows(&self) -> usize {
        self.max_rows
    }

    /// Normalises `raw`, using `data_type` if given and detection otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`ChartError::UnsupportedFormat`] for an unknown `data_type`,
    /// or any error from [`Self::normalize`].
    pub fn process(&self, raw: Value, data_type: Option<&str>) -> ChartResult<NormalizedData> {
        let tag = match data_type {
            Some(t) => t.parse()?,
            None => detect(&raw),
        };
        debug!(format = %tag, "normalising input");
        self.normalize(raw, tag)
    }

    /// Normalises `raw` as the given format.
    ///
    /// # Errors
    ///
    /// Returns an error if the input does not have the shape the format
    /// requires, or cannot be parsed as that format.
    pub fn normalize(&self, raw: Value, tag: FormatTag) -> ChartResult<NormalizedData> {
        match tag {
            FormatTag::JsonText => Self::normalize_json(raw),
            FormatTag::DelimitedText => self.normalize_csv(&raw),
            FormatTag::Spreadsheet => self.normalize_spreadsheet(&raw),
            FormatTag::StructuredMapping => Ok(self.normalize_mapping(raw)),
        }
    }

    fn normalize_json(raw: Value) -> ChartResult<NormalizedData> {
        let value = match raw {
            Value::String(text) => serde_json::from_str(&text)?,
            other => other,
        };
        Ok(NormalizedData::Opaque(value))
    }

    fn normalize_csv(&self, raw: &Value) -> ChartResult<NormalizedData> {
        let text = raw
            .as_str()
            .ok_or_else(|| ChartError::invalid_input("csv data must be a string"))?;
        let table = Table::from_csv(text, self.max_rows)?;
        debug!(rows = table.len(), columns = table.headers.len(), "read csv table");
        Ok(NormalizedData::Canonical(table.into_canonical()))
    }

    fn normalize_spreadsheet(&self, raw: &Value) -> ChartResult<NormalizedData> {
        let bytes = self.spreadsheet_bytes(raw)?;
        let table = Table::from_spreadsheet(bytes, self.max_rows)?;
        debug!(rows = table.len(), columns = table.headers.len(), "read spreadsheet table");
        Ok(NormalizedData::Canonical(table.into_canonical()))
    }

    /// Passes mappings through, capping an array `data` field. Arrays,
    /// numbers and other non-object values are passed through untouched.
    fn normalize_mapping(&self, mut raw: Value) -> NormalizedData {
        if let Some(Value::Array(rows)) = raw.get_mut("data") {
            if rows.len() > self.max_rows {
                debug!(from = rows.len(), to = self.max_rows, "truncating data rows");
                rows.truncate(self.max_rows);
            }
        }
        NormalizedData::Opaque(raw)
    }

    /// Resolves spreadsheet input to workbook bytes.
    ///
    /// Accepts a base64 string, `{"base64": "..."}` or `{"path": "..."}`.
    fn spreadsheet_bytes(&self, raw: &Value) -> ChartResult<Vec<u8>> {
        if let Some(encoded) = raw.as_str().or_else(|| raw.get("base64").and_then(Value::as_str)) {
            return BASE64_STANDARD
                .decode(encoded.trim())
                .map_err(|e| ChartError::invalid_input(format!("invalid base64 workbook: {e}")));
        }

        if let Some(path) = raw.get("path").and_then(Value::as_str) {
            let path = self.validate_path(path)?;
            return std::fs::read(&path).map_err(|e| ChartError::table(e.to_string()));
        }

        Err(ChartError::invalid_input(
            "excel data must be a base64 string, {\"base64\": ...} or {\"path\": ...}",
        ))
    }

    /// Checks that an existing file lies within one of the allowed directories.
    ///
    /// With no allowed directories configured every path is accepted.
    fn validate_path(&self, filepath: &str) -> ChartResult<PathBuf> {
        let path = Path::new(filepath)
            .canonicalize()
            .map_err(|e| ChartError::table(format!("cannot resolve '{filepath}': {e}")))?;

        if self.allowed_paths.is_empty() {
            return Ok(path);
        }

        let allowed = self
            .allowed_paths
            .iter()
            .filter_map(|p| p.canonicalize().ok())
            .any(|root| path.starts_with(root));

        if allowed {
            Ok(path)
        } else {
            Err(ChartError::invalid_input(
                "Access denied: path is outside the configured allowed directories",
            ))
        }
    }
}
