//! Chart templates and themes.
//!
//! The catalog is built once at startup and only read afterwards. Callers
//! always receive clones of templates, so a built option can never leak back
//! into the table.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde_json::{json, Value};

use crate::chart::error::ChartError;

/// Chart types with a built-in template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartType {
    /// Line chart over a category axis.
    Line,
    /// Bar chart over a category axis.
    Bar,
    /// Pie chart of `{name, value}` slices.
    Pie,
    /// Scatter plot over two value axes.
    Scatter,
}

/// How a chart type consumes data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartFamily {
    /// `xAxis` categories plus one or more series.
    Axis,
    /// A single series of named slices.
    Pie,
}

impl ChartType {
    /// All supported chart types, in advertised order.
    pub const ALL: [Self; 4] = [Self::Line, Self::Bar, Self::Pie, Self::Scatter];

    /// Returns the ECharts series type name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Line => "line",
            Self::Bar => "bar",
            Self::Pie => "pie",
            Self::Scatter => "scatter",
        }
    }

    /// Returns the fill policy family.
    #[must_use]
    pub const fn family(self) -> ChartFamily {
        match self {
            Self::Pie => ChartFamily::Pie,
            Self::Line | Self::Bar | Self::Scatter => ChartFamily::Axis,
        }
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartType {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ChartError::UnsupportedChartType {
                chart_type: s.to_string(),
            })
    }
}

/// A colour palette and background.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    /// Series colour cycle.
    pub color: Vec<String>,
    /// Canvas background colour.
    pub background_color: String,
}

impl Theme {
    fn new(palette: &[&str], background_color: &str) -> Self {
        Self {
            color: palette.iter().map(|c| (*c).to_string()).collect(),
            background_color: background_color.to_string(),
        }
    }
}

/// ECharts 5 default palette.
const DEFAULT_PALETTE: [&str; 9] = [
    "#5470c6", "#91cc75", "#fac858", "#ee6666", "#73c0de", "#3ba272", "#fc8452", "#9a60b4",
    "#ea7ccc",
];

/// Immutable template and theme tables.
#[derive(Debug, Clone)]
pub struct ChartCatalog {
    templates: IndexMap<ChartType, Value>,
    themes: IndexMap<String, Theme>,
}

impl Default for ChartCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ChartCatalog {
    /// Builds the catalog of built-in templates and the `light`/`dark` themes.
    #[must_use]
    pub fn builtin() -> Self {
        let templates = ChartType::ALL
            .into_iter()
            .map(|t| (t, builtin_template(t)))
            .collect();

        let mut themes = IndexMap::new();
        themes.insert("light".to_string(), Theme::new(&DEFAULT_PALETTE, "#fff"));
        themes.insert("dark".to_string(), Theme::new(&DEFAULT_PALETTE, "#1a1a1a"));

        Self { templates, themes }
    }

    /// Returns a fresh copy of the template for `chart_type`.
    #[must_use]
    pub fn template(&self, chart_type: ChartType) -> Value {
        self.templates
            .get(&chart_type)
            .cloned()
            .unwrap_or_else(|| builtin_template(chart_type))
    }

    /// Looks up a theme by name.
    #[must_use]
    pub fn theme(&self, name: &str) -> Option<&Theme> {
        self.themes.get(name)
    }

    /// Returns the theme names, in registration order.
    pub fn theme_names(&self) -> impl Iterator<Item = &str> {
        self.themes.keys().map(String::as_str)
    }
}

fn builtin_template(chart_type: ChartType) -> Value {
    match chart_type {
        ChartType::Line | ChartType::Bar => json!({
            "xAxis": { "type": "category", "data": [] },
            "yAxis": { "type": "value" },
            "series": [{ "data": [], "type": chart_type.as_str() }]
        }),
        ChartType::Pie => json!({
            "series": [{ "type": "pie", "data": [] }]
        }),
        ChartType::Scatter => json!({
            "xAxis": { "type": "value" },
            "yAxis": { "type": "value" },
            "series": [{ "data": [], "type": "scatter" }]
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_chart_types() {
        assert_eq!("line".parse::<ChartType>().unwrap(), ChartType::Line);
        assert_eq!("Pie".parse::<ChartType>().unwrap(), ChartType::Pie);
        let err = "radar".parse::<ChartType>().unwrap_err();
        assert!(matches!(err, ChartError::UnsupportedChartType { .. }));
    }

    #[test]
    fn families() {
        assert_eq!(ChartType::Pie.family(), ChartFamily::Pie);
        assert_eq!(ChartType::Scatter.family(), ChartFamily::Axis);
    }

    #[test]
    fn template_series_type_matches_tag() {
        let catalog = ChartCatalog::builtin();
        for chart_type in ChartType::ALL {
            let template = catalog.template(chart_type);
            assert_eq!(template["series"][0]["type"], chart_type.as_str());
        }
    }

    #[test]
    fn templates_are_independent_copies() {
        let catalog = ChartCatalog::builtin();
        let mut first = catalog.template(ChartType::Line);
        first["xAxis"]["data"] = json!(["mutated"]);
        assert_eq!(catalog.template(ChartType::Line)["xAxis"]["data"], json!([]));
    }

    #[test]
    fn themes() {
        let catalog = ChartCatalog::builtin();
        assert_eq!(catalog.theme_names().collect::<Vec<_>>(), vec!["light", "dark"]);
        assert_eq!(catalog.theme("dark").unwrap().background_color, "#1a1a1a");
        assert!(catalog.theme("neon").is_none());
    }
}
