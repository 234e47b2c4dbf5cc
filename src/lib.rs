//! echarts-mcp: MCP server that turns data into Apache ECharts options
//!
//! Tabular or structured input (JSON, CSV, spreadsheets, mappings) is
//! normalised into `{xAxis, series}` chart data, optionally aggregated, and
//! poured into line, bar, pie or scatter templates. Options can be optimised,
//! validated, rendered to standalone HTML and opened in a browser. An
//! OpenAI-compatible LLM endpoint can generate options from a prompt.
//!
//! # Modules
//!
//! - [`chart`] — the data and option pipeline
//! - [`config`] — Configuration loading and validation
//! - [`error`] — Configuration error types
//! - [`llm`] — Chat-completions client
//! - [`mcp`] — MCP protocol, server and tool registry

pub mod chart;
pub mod config;
pub mod error;
pub mod llm;
pub mod mcp;
