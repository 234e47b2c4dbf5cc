//! Reshaping normalised data for a target chart family.

use serde_json::{json, Value};
use tracing::debug;

use crate::chart::data::PieDatum;
use crate::chart::table::cell_label;

/// Reshapes `data` for `chart_type`.
///
/// Only `pie` changes the shape; any other chart type, known or not, passes
/// `data` through unchanged.
#[must_use]
pub fn format_for_chart(data: Value, chart_type: &str) -> Value {
    if chart_type.eq_ignore_ascii_case("pie") {
        let slices = pie_data(&data);
        debug!(slices = slices.len(), "reshaped data for pie chart");
        json!({ "data": slices })
    } else {
        data
    }
}

/// Flattens data into pie slices.
///
/// With `series`, every value of every named series becomes a slice labelled
/// by the matching `xAxis` category, or `<series>_<index>` past the end of
/// the axis. Without `series`, `{name, value}` items of a `data` array are
/// kept and anything else is dropped.
#[must_use]
pub fn pie_data(data: &Value) -> Vec<PieDatum> {
    let categories = data.get("xAxis").and_then(Value::as_array);

    if let Some(series) = data.get("series") {
        let Some(series) = series.as_array() else {
            return Vec::new();
        };
        return series
            .iter()
            .filter_map(|s| Some((s.get("name")?, s.get("data")?.as_array()?)))
            .flat_map(|(series_name, values)| {
                values.iter().enumerate().map(move |(i, value)| PieDatum {
                    name: categories
                        .and_then(|c| c.get(i))
                        .map_or_else(|| format!("{}_{i}", cell_label(series_name)), cell_label),
                    value: value.clone(),
                })
            })
            .collect();
    }

    data.get("data")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    Some(PieDatum {
                        name: cell_label(item.get("name")?),
                        value: item.get("value")?.clone(),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}
