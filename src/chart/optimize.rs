//! Option defaulting and structural validation.

use serde_json::{json, Value};

use crate::chart::error::{ChartError, ChartResult};

/// Fills in sensible defaults without overwriting anything already present.
///
/// - `responsive` and `animation` default to `true`.
/// - A missing `tooltip` is synthesised: axis-triggered when an `xAxis` key
///   exists, item-triggered otherwise.
/// - With more than one series and no `legend`, a legend listing each
///   series name (or `Series N` for unnamed series) is added.
///
/// Running it twice gives the same result as running it once.
///
/// # Errors
///
/// Returns [`ChartError::InvalidInput`] if `config` is not an object.
pub fn optimize(config: Value) -> ChartResult<Value> {
    let Value::Object(mut map) = config else {
        return Err(ChartError::invalid_input("chart config must be a JSON object"));
    };

    map.entry("responsive").or_insert(Value::Bool(true));
    map.entry("animation").or_insert(Value::Bool(true));

    if !map.contains_key("tooltip") {
        let trigger = if map.contains_key("xAxis") { "axis" } else { "item" };
        map.insert(
            "tooltip".to_string(),
            json!({ "trigger": trigger, "axisPointer": { "type": "cross" } }),
        );
    }

    if !map.contains_key("legend") {
        if let Some(Value::Array(series)) = map.get("series") {
            if series.len() > 1 {
                let names: Vec<Value> = series
                    .iter()
                    .enumerate()
                    .map(|(i, s)| {
                        s.get("name")
                            .cloned()
                            .unwrap_or_else(|| json!(format!("Series {}", i + 1)))
                    })
                    .collect();
                map.insert("legend".to_string(), json!({ "data": names }));
            }
        }
    }

    Ok(Value::Object(map))
}

/// Checks the option's structure.
///
/// The option must be an object. If it has `series`, that must be an array
/// of objects each carrying a `type`. Never fails: any defect is `false`.
#[must_use]
pub fn validate(config: &Value) -> bool {
    let Some(map) = config.as_object() else {
        return false;
    };

    match map.get("series") {
        None => true,
        Some(Value::Array(series)) => series
            .iter()
            .all(|s| s.as_object().is_some_and(|obj| obj.contains_key("type"))),
        Some(_) => false,
    }
}
