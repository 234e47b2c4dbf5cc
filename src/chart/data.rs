//! Canonical chart data shapes shared by every pipeline stage.
//!
//! All ingest paths converge on [`CanonicalChartData`]:
//!
//! ```json
//! { "xAxis": ["Mon", "Tue"], "series": [{ "name": "sales", "data": [1, 2], "type": "line" }] }
//! ```
//!
//! Inputs that already carry their own `data` field are passed through as an
//! opaque mapping instead (see [`NormalizedData::Opaque`]).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Chart type assigned to series produced from tabular input.
pub const DEFAULT_SERIES_TYPE: &str = "line";

/// Normalised `{xAxis, series}` data.
///
/// `series[i].data` is expected to line up with `x_axis` for axis-based
/// charts, but the lengths are never checked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalChartData {
    /// Category labels, in order.
    #[serde(rename = "xAxis", default)]
    pub x_axis: Vec<String>,

    /// Series, in order.
    #[serde(default)]
    pub series: Vec<Series>,

    /// Any other keys supplied alongside `xAxis`/`series`.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CanonicalChartData {
    /// Creates chart data from category labels and series.
    #[must_use]
    pub fn new(x_axis: Vec<String>, series: Vec<Series>) -> Self {
        Self {
            x_axis,
            series,
            extra: Map::new(),
        }
    }

    /// Returns the number of categories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.x_axis.len()
    }

    /// Returns `true` if there are no categories.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.x_axis.is_empty()
    }
}

/// A named data series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    /// Series name (the source column header for tabular input).
    #[serde(default)]
    pub name: String,

    /// Values, or a single reduced value after aggregation.
    pub data: SeriesData,

    /// Chart type tag for this series.
    #[serde(rename = "type", default = "default_series_type")]
    pub chart_type: String,
}

impl Series {
    /// Creates a series of values with the default `line` type.
    #[must_use]
    pub fn new(name: impl Into<String>, data: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            data: SeriesData::Values(data),
            chart_type: DEFAULT_SERIES_TYPE.to_string(),
        }
    }

    /// Sets the chart type tag.
    #[must_use]
    pub fn with_type(mut self, chart_type: impl Into<String>) -> Self {
        self.chart_type = chart_type.into();
        self
    }
}

fn default_series_type() -> String {
    DEFAULT_SERIES_TYPE.to_string()
}

/// Series payload.
///
/// Aggregation replaces the value sequence with a single scalar, which is
/// why both shapes exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SeriesData {
    /// Ordered values: numbers, or anything else the source carried.
    Values(Vec<Value>),
    /// A single reduced value.
    Scalar(Value),
}

impl SeriesData {
    /// Returns the value sequence, if this has not been reduced.
    #[must_use]
    pub fn values(&self) -> Option<&[Value]> {
        match self {
            Self::Values(values) => Some(values),
            Self::Scalar(_) => None,
        }
    }
}

/// A single pie slice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieDatum {
    /// Slice label.
    pub name: String,
    /// Slice value (normally a number, carried through as supplied).
    pub value: Value,
}

/// Output of the format normaliser.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NormalizedData {
    /// Tabular input reshaped into `{xAxis, series}`.
    Canonical(CanonicalChartData),
    /// JSON or mapping input passed through without reshaping.
    Opaque(Value),
}

impl NormalizedData {
    /// Converts into a JSON value.
    ///
    /// # Errors
    ///
    /// Returns an error if the canonical form cannot be serialised.
    pub fn into_value(self) -> serde_json::Result<Value> {
        match self {
            Self::Canonical(data) => serde_json::to_value(data),
            Self::Opaque(value) => Ok(value),
        }
    }
}
