//! Tabular input: delimited text and spreadsheet workbooks.
//!
//! Only what the normaliser needs is provided here: a header row, column
//! access and a row cap applied while reading, so oversized inputs are never
//! fully materialised.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use serde_json::{Number, Value};

use crate::chart::data::{CanonicalChartData, Series};
use crate::chart::error::{ChartError, ChartResult};

/// A header row plus data rows of typed cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    /// Column names from the header row.
    pub headers: Vec<String>,
    /// Data rows, each padded to the header width.
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    /// Reads comma-delimited text with a header row, keeping at most `max_rows` rows.
    ///
    /// Cells that parse as integers or floats become numbers, empty cells
    /// become `null`, everything else stays text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid CSV.
    pub fn from_csv(text: &str, max_rows: usize) -> ChartResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| ChartError::table(e.to_string()))?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        for record in reader.records().take(max_rows) {
            let record = record.map_err(|e| ChartError::table(e.to_string()))?;
            rows.push(pad_row(record.iter().map(csv_cell).collect(), headers.len()));
        }

        Ok(Self { headers, rows })
    }

    /// Reads the first worksheet of an xlsx/xls/ods workbook, keeping at most `max_rows` rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a readable workbook or it has no worksheets.
    pub fn from_spreadsheet(bytes: Vec<u8>, max_rows: usize) -> ChartResult<Self> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
            .map_err(|e| ChartError::table(e.to_string()))?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| ChartError::table("workbook has no worksheets"))?
            .map_err(|e| ChartError::table(e.to_string()))?;

        let mut row_iter = range.rows();
        let headers: Vec<String> = row_iter
            .next()
            .map(|row| row.iter().map(ToString::to_string).collect())
            .unwrap_or_default();

        let rows = row_iter
            .take(max_rows)
            .map(|row| pad_row(row.iter().map(spreadsheet_cell).collect(), headers.len()))
            .collect();

        Ok(Self { headers, rows })
    }

    /// Returns the number of data rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if there are no data rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the values of column `index`, top to bottom.
    pub fn column(&self, index: usize) -> impl Iterator<Item = &Value> + '_ {
        self.rows.iter().filter_map(move |row| row.get(index))
    }

    /// Reshapes the table into `{xAxis, series}`.
    ///
    /// The first column, stringified, becomes the category axis. Every other
    /// column becomes a `line` series named after its header. A table with no
    /// data rows yields empty chart data.
    #[must_use]
    pub fn into_canonical(self) -> CanonicalChartData {
        if self.rows.is_empty() || self.headers.is_empty() {
            return CanonicalChartData::default();
        }

        let x_axis = self.column(0).map(cell_label).collect();
        let series = self
            .headers
            .iter()
            .enumerate()
            .skip(1)
            .map(|(index, name)| Series::new(name.clone(), self.column(index).cloned().collect()))
            .collect();

        CanonicalChartData::new(x_axis, series)
    }
}

fn pad_row(mut row: Vec<Value>, width: usize) -> Vec<Value> {
    if row.len() < width {
        row.resize(width, Value::Null);
    }
    row
}

fn csv_cell(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::Null;
    }
    if let Ok(n) = raw.parse::<i64>() {
        return Value::from(n);
    }
    if let Some(n) = raw.parse::<f64>().ok().and_then(Number::from_f64) {
        return Value::Number(n);
    }
    Value::String(raw.to_string())
}

fn spreadsheet_cell(cell: &Data) -> Value {
    match cell {
        Data::Empty | Data::Error(_) => Value::Null,
        Data::Int(n) => Value::from(*n),
        Data::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
        Data::Bool(b) => Value::Bool(*b),
        Data::String(s) => Value::String(s.clone()),
        other => Value::String(other.to_string()),
    }
}

/// Stringifies a cell for use as a category label. Empty cells label as `""`.
#[must_use]
pub fn cell_label(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
