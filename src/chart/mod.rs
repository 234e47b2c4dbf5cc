//! Data normalisation and chart option pipeline.
//!
//! ```text
//! raw input ──▶ detect ──▶ normalize ──▶ (aggregate) ──▶ build ──▶ optimize ──▶ render
//! ```
//!
//! - [`detect`] — decide the input format when the caller did not
//! - [`normalize`] — JSON, CSV, spreadsheet or mapping into `{xAxis, series}`
//! - [`aggregate`] — reduce each series to one value
//! - [`format`] — reshape for a chart family (pie slices)
//! - [`catalog`] — immutable templates and themes
//! - [`builder`] — template instantiation and data fill
//! - [`optimize`] — defaulting and structural validation
//! - [`render`] — standalone HTML documents
//!
//! Every stage is synchronous and all-or-nothing: it either returns a new
//! value or an error, never a partially transformed one.

pub mod aggregate;
pub mod builder;
pub mod catalog;
pub mod data;
pub mod detect;
pub mod error;
pub mod format;
pub mod normalize;
pub mod optimize;
pub mod render;
pub mod table;

pub use aggregate::{aggregate, aggregate_value, Reduction};
pub use builder::build;
pub use catalog::{ChartCatalog, ChartFamily, ChartType, Theme};
pub use data::{CanonicalChartData, NormalizedData, PieDatum, Series, SeriesData};
pub use detect::{detect, FormatTag};
pub use error::{ChartError, ChartResult};
pub use format::format_for_chart;
pub use normalize::Normalizer;
pub use optimize::{optimize, validate};
