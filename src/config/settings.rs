//! Configuration structures for deserialisation.
//!
//! These structures map directly to the JSON configuration file format.

use std::fmt;
use std::path::PathBuf;

use serde::Deserialize;

use crate::chart::catalog::ChartCatalog;
use crate::chart::normalize::DEFAULT_MAX_ROWS;
use crate::chart::render::{DEFAULT_ECHARTS_VERSION, DEFAULT_HEIGHT};
use crate::error::ConfigError;

/// Root configuration structure.
///
/// This is the top-level structure that matches the JSON config file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Optional JSON schema reference (ignored during parsing).
    #[serde(rename = "$schema", default)]
    _schema: Option<String>,

    /// Optional comment field (ignored during parsing).
    #[serde(rename = "_comment", default)]
    _comment: Option<String>,

    /// LLM endpoint settings.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Chart output settings.
    #[serde(default)]
    pub charts: ChartsConfig,

    /// Data ingest settings.
    #[serde(default)]
    pub data: DataConfig,

    /// Directories spreadsheet files may be read from.
    #[serde(default)]
    pub allowed_paths: Vec<PathBuf>,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any validation checks fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.data.max_rows == 0 {
            return Err(ConfigError::invalid("data.max_rows", "must be greater than 0"));
        }

        if self.llm.timeout_secs == 0 {
            return Err(ConfigError::invalid("llm.timeout_secs", "must be greater than 0"));
        }

        let catalog = ChartCatalog::builtin();
        if catalog.theme(&self.charts.default_theme).is_none() {
            let known: Vec<&str> = catalog.theme_names().collect();
            return Err(ConfigError::invalid(
                "charts.default_theme",
                format!(
                    "'{}' is not one of: {}",
                    self.charts.default_theme,
                    known.join(", ")
                ),
            ));
        }

        if self.charts.default_height.trim().is_empty() {
            return Err(ConfigError::invalid("charts.default_height", "cannot be empty"));
        }

        Ok(())
    }
}

/// Chat-completions endpoint configuration.
#[derive(Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LlmConfig {
    /// Chat-completions URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Model name sent with each request.
    #[serde(default = "default_model")]
    pub model: String,

    /// API key. Takes precedence over `api_key_env`.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Environment variable consulted when `api_key` is unset.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Sampling temperature for chart generation.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Completion token limit for chart generation.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl LlmConfig {
    /// Returns the API key from the config or, failing that, the environment.
    #[must_use]
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|key| !key.trim().is_empty())
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            model: default_model(),
            api_key: None,
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

// The key must never reach logs.
impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_key_env", &self.api_key_env)
            .field("timeout_secs", &self.timeout_secs)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

fn default_api_url() -> String {
    "https://api.deepseek.com/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "deepseek-chat".to_string()
}

fn default_api_key_env() -> String {
    "DEEPSEEK_API_KEY".to_string()
}

const fn default_timeout_secs() -> u64 {
    30
}

const fn default_temperature() -> f32 {
    0.3
}

const fn default_max_tokens() -> u32 {
    2048
}

/// Chart output configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChartsConfig {
    /// ECharts release loaded by generated HTML.
    #[serde(default = "default_echarts_version")]
    pub echarts_version: String,

    /// Theme used when a tool call names none.
    #[serde(default = "default_theme")]
    pub default_theme: String,

    /// Container height used when a tool call names none.
    #[serde(default = "default_height")]
    pub default_height: String,

    /// Whether the open tools launch a browser, or only write the file.
    #[serde(default = "default_true")]
    pub open_browser: bool,
}

impl Default for ChartsConfig {
    fn default() -> Self {
        Self {
            echarts_version: default_echarts_version(),
            default_theme: default_theme(),
            default_height: default_height(),
            open_browser: default_true(),
        }
    }
}

fn default_echarts_version() -> String {
    DEFAULT_ECHARTS_VERSION.to_string()
}

fn default_theme() -> String {
    "light".to_string()
}

fn default_height() -> String {
    DEFAULT_HEIGHT.to_string()
}

const fn default_true() -> bool {
    true
}

/// Data ingest configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DataConfig {
    /// Rows kept from tabular input and `data` arrays.
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            max_rows: default_max_rows(),
        }
    }
}

const fn default_max_rows() -> usize {
    DEFAULT_MAX_ROWS
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}
