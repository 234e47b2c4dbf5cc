//! Series aggregation.
//!
//! Reduces each series' values to one scalar. This is one-way: the value
//! sequence is replaced, not kept alongside the result.

use std::fmt;

use serde_json::{Number, Value};
use tracing::{debug, warn};

use crate::chart::data::{CanonicalChartData, Series, SeriesData};
use crate::chart::error::{ChartError, ChartResult};

/// Reduction applied to a series' numeric values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Reduction {
    /// Sum of values.
    #[default]
    Sum,
    /// Arithmetic mean of values.
    Average,
    /// Largest value.
    Max,
    /// Smallest value.
    Min,
}

impl Reduction {
    /// Parses a reduction name, falling back to [`Reduction::Sum`] for
    /// anything unrecognised.
    ///
    /// Accepts `sum`, `average`/`avg`/`mean`, `max`, `min` (case-insensitive).
    #[must_use]
    pub fn from_str_lenient(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "sum" => Self::Sum,
            "average" | "avg" | "mean" => Self::Average,
            "max" => Self::Max,
            "min" => Self::Min,
            _ => {
                warn!(aggregation = s, "unknown aggregation, using sum");
                Self::Sum
            }
        }
    }

    /// Reduces `values`, ignoring everything that is not a JSON number.
    ///
    /// Returns `0` when no numeric values remain. Integer inputs stay integers
    /// except under [`Reduction::Average`] or on overflow.
    #[must_use]
    pub fn apply(self, values: &[Value]) -> Value {
        let numbers: Vec<&Number> = values.iter().filter_map(Value::as_number).collect();
        if numbers.is_empty() {
            return Value::from(0);
        }

        if self != Self::Average {
            let ints: Option<Vec<i64>> = numbers.iter().map(|n| n.as_i64()).collect();
            if let Some(result) = ints.and_then(|ints| self.apply_int(&ints)) {
                return Value::from(result);
            }
        }

        let floats: Vec<f64> = numbers.iter().filter_map(|n| n.as_f64()).collect();
        Number::from_f64(self.apply_float(&floats)).map_or(Value::Null, Value::Number)
    }

    fn apply_int(self, values: &[i64]) -> Option<i64> {
        match self {
            Self::Sum => values.iter().try_fold(0_i64, |acc, &v| acc.checked_add(v)),
            Self::Max => values.iter().copied().max(),
            Self::Min => values.iter().copied().min(),
            Self::Average => None,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn apply_float(self, values: &[f64]) -> f64 {
        match self {
            Self::Sum => values.iter().sum(),
            Self::Average => values.iter().sum::<f64>() / values.len() as f64,
            Self::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Self::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
        }
    }
}

impl fmt::Display for Reduction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sum => write!(f, "sum"),
            Self::Average => write!(f, "average"),
            Self::Max => write!(f, "max"),
            Self::Min => write!(f, "min"),
        }
    }
}

/// Reduces every series in `data` to a single value.
///
/// Names, types and the category axis are kept. Series that were already
/// reduced are carried over unchanged.
#[must_use]
pub fn aggregate(data: CanonicalChartData, reduction: Reduction) -> CanonicalChartData {
    let series = data
        .series
        .into_iter()
        .map(|series| {
            let reduced = match &series.data {
                SeriesData::Values(values) => reduction.apply(values),
                SeriesData::Scalar(value) => value.clone(),
            };
            Series {
                data: SeriesData::Scalar(reduced),
                ..series
            }
        })
        .collect();

    CanonicalChartData { series, ..data }
}

/// Aggregates a JSON value holding `{xAxis, series}` data.
///
/// Only `series` is read. Each series object with an array `data` has it
/// replaced by the reduced value; one whose `data` is already a scalar is kept
/// as is; elements with no `data` at all are dropped. Every other key,
/// `xAxis` included, is left untouched whatever its contents. Values without
/// a `series` key are returned unchanged.
///
/// # Errors
///
/// Returns [`ChartError::InvalidInput`] if `series` is present but is not an array.
pub fn aggregate_value(mut value: Value, reduction: Reduction) -> ChartResult<Value> {
    let Some(series) = value.get_mut("series") else {
        debug!("no series to aggregate");
        return Ok(value);
    };
    let Value::Array(items) = series.take() else {
        return Err(ChartError::invalid_input(
            "cannot aggregate data: series must be an array",
        ));
    };

    debug!(%reduction, series = items.len(), "aggregating series");
    *series = items
        .into_iter()
        .filter_map(|mut item| {
            let data = item.get_mut("data")?;
            if let Some(values) = data.as_array() {
                *data = reduction.apply(values);
            }
            Some(item)
        })
        .collect();
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lenient_parse() {
        assert_eq!(Reduction::from_str_lenient("AVG"), Reduction::Average);
        assert_eq!(Reduction::from_str_lenient("average"), Reduction::Average);
        assert_eq!(Reduction::from_str_lenient("max"), Reduction::Max);
        assert_eq!(Reduction::from_str_lenient("median"), Reduction::Sum);
    }

    #[test]
    fn integer_sum_stays_integer() {
        assert_eq!(Reduction::Sum.apply(&[json!(1), json!(2), json!(3)]), json!(6));
    }

    #[test]
    fn mixed_numbers_reduce_as_floats() {
        assert_eq!(Reduction::Sum.apply(&[json!(1), json!(0.5)]), json!(1.5));
        assert_eq!(Reduction::Max.apply(&[json!(1), json!(2.5)]), json!(2.5));
    }

    #[test]
    fn average_is_float() {
        assert_eq!(Reduction::Average.apply(&[json!(1), json!(2)]), json!(1.5));
    }

    #[test]
    fn non_numeric_entries_are_ignored() {
        let values = [json!(4), json!("x"), Value::Null, json!(true), json!(2)];
        assert_eq!(Reduction::Sum.apply(&values), json!(6));
        assert_eq!(Reduction::Min.apply(&values), json!(2));
    }

    #[test]
    fn no_numeric_entries_is_zero() {
        let values = [json!("a"), Value::Null];
        for reduction in [Reduction::Sum, Reduction::Average, Reduction::Max, Reduction::Min] {
            assert_eq!(reduction.apply(&values), json!(0));
        }
    }

    #[test]
    fn overflowing_sum_falls_back_to_float() {
        let result = Reduction::Sum.apply(&[json!(i64::MAX), json!(1)]);
        assert!(result.is_f64());
    }

    #[test]
    fn aggregate_keeps_name_type_and_axis() {
        let data = CanonicalChartData::new(
            vec!["a".to_string(), "b".to_string()],
            vec![Series::new("s1", vec![json!(2), json!(5)]).with_type("bar")],
        );
        let out = aggregate(data, Reduction::Max);
        assert_eq!(out.x_axis, vec!["a", "b"]);
        assert_eq!(out.series[0].name, "s1");
        assert_eq!(out.series[0].chart_type, "bar");
        assert_eq!(out.series[0].data, SeriesData::Scalar(json!(5)));
    }

    #[test]
    fn aggregate_value_without_series_is_untouched() {
        let value = json!({ "data": [1, 2] });
        assert_eq!(aggregate_value(value.clone(), Reduction::Sum).unwrap(), value);
    }

    #[test]
    fn aggregate_value_reduces_series() {
        let value = json!({
            "xAxis": ["a", "b"],
            "series": [{ "name": "s", "data": [1, "x", 3], "type": "line" }]
        });
        let out = aggregate_value(value, Reduction::Sum).unwrap();
        assert_eq!(out["series"][0]["data"], json!(4));
        assert_eq!(out["xAxis"], json!(["a", "b"]));
    }

    #[test]
    fn aggregate_value_leaves_numeric_axis_alone() {
        let value = json!({
            "xAxis": [2021, 2022],
            "series": [{ "name": 7, "data": [1, 2], "type": "line", "stack": "a" }]
        });
        let out = aggregate_value(value, Reduction::Sum).unwrap();
        assert_eq!(out["xAxis"], json!([2021, 2022]));
        assert_eq!(
            out["series"][0],
            json!({ "name": 7, "data": 3, "type": "line", "stack": "a" })
        );
    }

    #[test]
    fn aggregate_value_drops_series_without_data() {
        let value = json!({
            "series": [
                { "name": "empty", "type": "bar" },
                { "name": "s", "data": [2, 8], "type": "bar" },
                "not a series"
            ]
        });
        let out = aggregate_value(value, Reduction::Average).unwrap();
        assert_eq!(out["series"], json!([{ "name": "s", "data": 5.0, "type": "bar" }]));
    }

    #[test]
    fn aggregate_value_keeps_reduced_series() {
        let value = json!({ "series": [{ "name": "s", "data": 9, "type": "line" }] });
        assert_eq!(aggregate_value(value.clone(), Reduction::Min).unwrap(), value);
    }

    #[test]
    fn aggregate_value_rejects_malformed_series() {
        let err = aggregate_value(json!({ "series": 5 }), Reduction::Sum).unwrap_err();
        assert!(matches!(err, ChartError::InvalidInput { .. }));
    }
}
