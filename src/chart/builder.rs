//! Chart option construction from templates.

use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::chart::catalog::{ChartCatalog, ChartFamily, ChartType};
use crate::chart::error::{ChartError, ChartResult};

/// Builds an ECharts option for `chart_type`.
///
/// Starts from a copy of the template, sets the title when non-empty,
/// applies the named theme (unknown themes are skipped) and fills in `data`.
/// Missing or empty `data` yields a valid skeleton chart.
///
/// # Errors
///
/// Returns [`ChartError::UnsupportedChartType`] if `chart_type` has no
/// template, or [`ChartError::InvalidInput`] if `data` is not an object.
pub fn build(
    catalog: &ChartCatalog,
    chart_type: &str,
    data: Option<&Value>,
    title: &str,
    theme: &str,
) -> ChartResult<Value> {
    let chart_type: ChartType = chart_type.parse()?;
    let mut config = catalog.template(chart_type);

    if !title.is_empty() {
        config["title"] = json!({ "text": title });
    }

    match catalog.theme(theme) {
        Some(theme) => {
            config["color"] = json!(theme.color);
            config["backgroundColor"] = json!(theme.background_color);
        }
        None => warn!(theme, "unknown theme, leaving template colours"),
    }

    match data {
        None | Some(Value::Null) => {}
        Some(Value::Object(map)) if map.is_empty() => {}
        Some(data @ Value::Object(_)) => fill_data(&mut config, chart_type, data),
        Some(_) => return Err(ChartError::invalid_input("chart data must be a JSON object")),
    }

    debug!(%chart_type, "built chart option");
    Ok(config)
}

fn fill_data(config: &mut Value, chart_type: ChartType, data: &Value) {
    match chart_type.family() {
        ChartFamily::Pie => fill_pie(config, data),
        ChartFamily::Axis => fill_axis(config, chart_type, data),
    }
}

fn fill_pie(config: &mut Value, data: &Value) {
    if let Some(slices) = data.get("data") {
        config["series"][0]["data"] = slices.clone();
    }
}

/// The template's series type always wins over per-series types supplied by
/// the caller, so the requested chart family is preserved.
fn fill_axis(config: &mut Value, chart_type: ChartType, data: &Value) {
    if let Some(categories) = data.get("xAxis") {
        config["xAxis"]["data"] = categories.clone();
    }

    match data.get("series") {
        Some(Value::Array(series)) => {
            let series = series
                .iter()
                .cloned()
                .map(|mut s| {
                    if let Some(obj) = s.as_object_mut() {
                        obj.insert("type".to_string(), json!(chart_type.as_str()));
                    }
                    s
                })
                .collect();
            config["series"] = Value::Array(series);
        }
        Some(Value::Object(single)) => {
            if let Some(values) = single.get("data") {
                config["series"][0]["data"] = values.clone();
            }
        }
        _ => {}
    }
}
