//! Tool dispatch registry.
//!
//! A static table maps each tool name to its parameters and a handler over the
//! chart pipeline. The table drives both `tools/list` and dispatch.
//!
//! Every handler is a failure boundary: pipeline errors come back as
//! `{"error": message, "status": "error"}` envelopes instead of propagating,
//! so one failing call in a batch never affects its siblings.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::chart::error::{ChartError, ChartResult};
use crate::chart::render::{self, ChartFile};
use crate::chart::{
    aggregate_value, build, format_for_chart, optimize, validate, ChartCatalog, Normalizer,
    Reduction,
};
use crate::config::{ChartsConfig, Config};
use crate::llm::LlmClient;

/// Status value of a successful envelope.
pub const STATUS_SUCCESS: &str = "success";

/// Status value of a failed envelope.
pub const STATUS_ERROR: &str = "error";

/// JSON type accepted for a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParamKind {
    String,
    Object,
    /// Object or string; the handler decides.
    Any,
}

/// A declared tool parameter.
#[derive(Debug)]
struct Param {
    name: &'static str,
    kind: ParamKind,
    required: bool,
    description: &'static str,
}

const fn required(name: &'static str, kind: ParamKind, description: &'static str) -> Param {
    Param {
        name,
        kind,
        required: true,
        description,
    }
}

const fn optional(name: &'static str, kind: ParamKind, description: &'static str) -> Param {
    Param {
        name,
        kind,
        required: false,
        description,
    }
}

/// Pipeline operation behind a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ToolKind {
    GenerateConfig,
    CreateChart,
    ProcessData,
    AggregateData,
    OptimizeChart,
    ValidateChart,
    GenerateHtml,
    CreateAndOpenChart,
    OpenChart,
}

/// A registered tool.
#[derive(Debug)]
pub struct ToolSpec {
    /// Tool name used by callers.
    pub name: &'static str,
    /// Human-readable description.
    pub description: &'static str,
    params: &'static [Param],
    kind: ToolKind,
}

impl ToolSpec {
    /// Names of the parameters a caller must supply.
    pub fn required_params(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.params.iter().filter(|p| p.required).map(|p| p.name)
    }

    /// Names of the parameters a caller may omit.
    pub fn optional_params(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.params.iter().filter(|p| !p.required).map(|p| p.name)
    }

    /// JSON Schema describing the tool's arguments.
    #[must_use]
    pub fn input_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .params
            .iter()
            .map(|param| {
                let mut schema = json!({ "description": param.description });
                match param.kind {
                    ParamKind::String => schema["type"] = json!("string"),
                    ParamKind::Object => schema["type"] = json!("object"),
                    ParamKind::Any => {}
                }
                (param.name.to_string(), schema)
            })
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": self.required_params().collect::<Vec<_>>(),
        })
    }

    /// Definition advertised by `tools/list`.
    #[must_use]
    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name.to_string(),
            description: Some(self.description.to_string()),
            input_schema: self.input_schema(),
        }
    }
}

/// A tool definition for tools/list response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    /// Unique tool name.
    pub name: String,
    /// Human-readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON Schema for the tool's input parameters.
    pub input_schema: Value,
}

const DATA_DESCRIPTION: &str =
    "Chart data: an {xAxis, series} object, a mapping, JSON text, CSV text, \
     or a spreadsheet as base64 / {\"base64\"} / {\"path\"}";

/// All tools, in advertised order.
pub static TOOLS: [ToolSpec; 9] = [
    ToolSpec {
        name: "generate_echarts_config",
        description: "Generate an ECharts option from a natural-language request using the \
                      configured LLM. Requires an API key.",
        params: &[
            required("prompt", ParamKind::String, "What the chart should show"),
            optional("data", ParamKind::Any, DATA_DESCRIPTION),
        ],
        kind: ToolKind::GenerateConfig,
    },
    ToolSpec {
        name: "create_chart",
        description: "Build an ECharts option from a line, bar, pie or scatter template, \
                      filled with data, titled and themed.",
        params: &[
            required("chart_type", ParamKind::String, "line, bar, pie or scatter"),
            optional("data", ParamKind::Object, "{xAxis, series} for axis charts, {data} for pie"),
            optional("title", ParamKind::String, "Chart title (default: none)"),
            optional("theme", ParamKind::String, "light or dark (default: configured theme)"),
        ],
        kind: ToolKind::CreateChart,
    },
    ToolSpec {
        name: "process_data",
        description: "Normalise raw data (JSON, CSV, spreadsheet or mapping) into chart data, \
                      optionally aggregating series and reshaping for a chart type.",
        params: &[
            required("data", ParamKind::Any, DATA_DESCRIPTION),
            optional("data_type", ParamKind::String, "json, csv, excel or dict (default: detected)"),
            optional("chart_type", ParamKind::String, "Reshape for this chart type (pie builds slices)"),
            optional("aggregation", ParamKind::String, "sum, average, max or min"),
        ],
        kind: ToolKind::ProcessData,
    },
    ToolSpec {
        name: "aggregate_data",
        description: "Reduce every series in {xAxis, series} data to a single value.",
        params: &[
            required("data", ParamKind::Object, "{xAxis, series} chart data"),
            optional("aggregation", ParamKind::String, "sum, average, max or min (default: sum)"),
        ],
        kind: ToolKind::AggregateData,
    },
    ToolSpec {
        name: "optimize_chart",
        description: "Add responsive, animation, tooltip and legend defaults to an ECharts option \
                      without overwriting existing keys.",
        params: &[required("config", ParamKind::Object, "ECharts option")],
        kind: ToolKind::OptimizeChart,
    },
    ToolSpec {
        name: "validate_chart",
        description: "Check the structure of an ECharts option: series must be a list of \
                      objects that each carry a type.",
        params: &[required("config", ParamKind::Object, "ECharts option")],
        kind: ToolKind::ValidateChart,
    },
    ToolSpec {
        name: "generate_html",
        description: "Render an ECharts option as a standalone HTML document.",
        params: &[
            required("config", ParamKind::Object, "ECharts option"),
            optional("height", ParamKind::String, "CSS height of the chart (default: configured height)"),
        ],
        kind: ToolKind::GenerateHtml,
    },
    ToolSpec {
        name: "create_and_open_chart",
        description: "Build a chart from a template, write it to an HTML file and open it in \
                      the browser.",
        params: &[
            required("chart_type", ParamKind::String, "line, bar, pie or scatter"),
            optional("data", ParamKind::Object, "{xAxis, series} for axis charts, {data} for pie"),
            optional("title", ParamKind::String, "Chart title (default: none)"),
            optional("theme", ParamKind::String, "light or dark (default: configured theme)"),
            optional("height", ParamKind::String, "CSS height of the chart (default: configured height)"),
        ],
        kind: ToolKind::CreateAndOpenChart,
    },
    ToolSpec {
        name: "open_chart",
        description: "Write an ECharts option to an HTML file and open it in the browser.",
        params: &[
            required("config", ParamKind::Object, "ECharts option"),
            optional("height", ParamKind::String, "CSS height of the chart (default: configured height)"),
        ],
        kind: ToolKind::OpenChart,
    },
];

/// Shared, read-only state the handlers run against.
#[derive(Debug)]
pub struct ToolContext {
    /// Chart templates and themes.
    pub catalog: ChartCatalog,
    /// Input normaliser.
    pub normalizer: Normalizer,
    /// Chart output settings.
    pub charts: ChartsConfig,
    /// LLM client for prompt-driven generation.
    pub llm: LlmClient,
}

impl ToolContext {
    /// Builds the context from loaded configuration.
    ///
    /// An empty `allowed_paths` list is replaced by the working directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the LLM client cannot be created.
    pub fn from_config(config: &Config) -> ChartResult<Self> {
        let allowed_paths = if config.allowed_paths.is_empty() {
            vec![std::path::PathBuf::from(".")]
        } else {
            config.allowed_paths.clone()
        };

        Ok(Self {
            catalog: ChartCatalog::builtin(),
            normalizer: Normalizer::new(config.data.max_rows).with_allowed_paths(allowed_paths),
            charts: config.charts.clone(),
            llm: LlmClient::new(&config.llm)?,
        })
    }
}

/// One entry of a `tools/batch` request.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCall {
    /// Tool name.
    pub name: String,
    /// Tool arguments.
    #[serde(default)]
    pub parameters: Value,
}

/// Parameters of a `tools/batch` request.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchRequest {
    /// Calls to run, in order.
    pub tools: Vec<ToolCall>,
    /// Caller-supplied context. Accepted and ignored.
    #[serde(default)]
    pub context: Option<Value>,
}

/// Result of one call within a batch.
#[derive(Debug, Clone, Serialize)]
pub struct ToolResponse {
    /// `tool_<index>` of the call within the batch.
    pub tool_call_id: String,
    /// The call's envelope.
    pub result: Value,
}

/// Result of a `tools/batch` request.
#[derive(Debug, Clone, Serialize)]
pub struct BatchResponse {
    /// One response per call, in call order.
    pub tool_responses: Vec<ToolResponse>,
    /// Always `completed`.
    pub status: &'static str,
}

/// Returns `true` if `envelope` reports a failure.
#[must_use]
pub fn is_error_envelope(envelope: &Value) -> bool {
    envelope.get("status").and_then(Value::as_str) == Some(STATUS_ERROR)
}

fn error_envelope(message: impl Into<String>) -> Value {
    json!({ "error": message.into(), "status": STATUS_ERROR })
}

/// The tool registry.
#[derive(Debug)]
pub struct ToolRegistry {
    context: ToolContext,
}

impl ToolRegistry {
    /// Creates a registry over `context`.
    #[must_use]
    pub const fn new(context: ToolContext) -> Self {
        Self { context }
    }

    /// Returns the registry's context.
    #[must_use]
    pub const fn context(&self) -> &ToolContext {
        &self.context
    }

    /// Looks up a tool by name.
    #[must_use]
    pub fn spec(name: &str) -> Option<&'static ToolSpec> {
        TOOLS.iter().find(|tool| tool.name == name)
    }

    /// Definitions of every tool, in advertised order.
    #[must_use]
    pub fn definitions() -> Vec<ToolDefinition> {
        TOOLS.iter().map(ToolSpec::definition).collect()
    }

    /// Runs a tool and returns its envelope. Never fails.
    pub async fn dispatch(&self, name: &str, arguments: &Value) -> Value {
        let Some(spec) = Self::spec(name) else {
            warn!(tool = name, "unknown tool");
            return error_envelope(format!("unknown tool: {name}"));
        };

        let empty = Map::new();
        let args = match arguments {
            Value::Object(map) => map,
            Value::Null => &empty,
            _ => return error_envelope("arguments must be a JSON object"),
        };

        if let Some(missing) = spec
            .required_params()
            .find(|param| args.get(*param).map_or(true, Value::is_null))
        {
            return error_envelope(format!("Missing required parameter: {missing}"));
        }

        debug!(tool = name, "dispatching tool call");
        match self.run(spec.kind, args).await {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(tool = name, error = %e, "tool call failed");
                error_envelope(e.to_string())
            }
        }
    }

    /// Runs each call in order, independently of the others.
    pub async fn call_batch(&self, calls: &[ToolCall]) -> BatchResponse {
        let mut tool_responses = Vec::with_capacity(calls.len());
        for (index, call) in calls.iter().enumerate() {
            let result = self.dispatch(&call.name, &call.parameters).await;
            tool_responses.push(ToolResponse {
                tool_call_id: format!("tool_{index}"),
                result,
            });
        }

        BatchResponse {
            tool_responses,
            status: "completed",
        }
    }

    async fn run(&self, kind: ToolKind, args: &Map<String, Value>) -> ChartResult<Value> {
        match kind {
            ToolKind::GenerateConfig => self.generate_config(args).await,
            ToolKind::CreateChart => {
                let config = self.create_chart(args)?;
                Ok(json!({ "config": config, "status": STATUS_SUCCESS }))
            }
            ToolKind::ProcessData => self.process_data(args),
            ToolKind::AggregateData => {
                let reduction = Reduction::from_str_lenient(str_arg(args, "aggregation")?.unwrap_or("sum"));
                let data = aggregate_value(arg(args, "data").clone(), reduction)?;
                Ok(json!({ "data": data, "status": STATUS_SUCCESS }))
            }
            ToolKind::OptimizeChart => {
                let config = optimize(arg(args, "config").clone())?;
                Ok(json!({ "config": config, "status": STATUS_SUCCESS }))
            }
            ToolKind::ValidateChart => {
                let valid = validate(arg(args, "config"));
                Ok(json!({ "valid": valid, "status": STATUS_SUCCESS }))
            }
            ToolKind::GenerateHtml => {
                let html = render::generate_html(
                    arg(args, "config"),
                    self.height(args)?,
                    &self.context.charts.echarts_version,
                )?;
                Ok(json!({ "html": html, "status": STATUS_SUCCESS }))
            }
            ToolKind::CreateAndOpenChart => {
                let config = self.create_chart(args)?;
                self.open(&config, self.height(args)?)
            }
            ToolKind::OpenChart => self.open(arg(args, "config"), self.height(args)?),
        }
    }

    async fn generate_config(&self, args: &Map<String, Value>) -> ChartResult<Value> {
        let prompt = str_arg(args, "prompt")?.unwrap_or_default();
        let data = args.get("data").filter(|v| !v.is_null());
        let config = self.context.llm.generate_chart_config(prompt, data).await?;
        Ok(json!({ "config": config, "status": STATUS_SUCCESS }))
    }

    fn create_chart(&self, args: &Map<String, Value>) -> ChartResult<Value> {
        let chart_type = str_arg(args, "chart_type")?.unwrap_or_default();
        let title = str_arg(args, "title")?.unwrap_or_default();
        let theme = str_arg(args, "theme")?.unwrap_or(&self.context.charts.default_theme);
        build(&self.context.catalog, chart_type, args.get("data"), title, theme)
    }

    fn process_data(&self, args: &Map<String, Value>) -> ChartResult<Value> {
        let normalized = self
            .context
            .normalizer
            .process(arg(args, "data").clone(), str_arg(args, "data_type")?)?;
        let mut data = normalized.into_value()?;

        if let Some(aggregation) = str_arg(args, "aggregation")? {
            data = aggregate_value(data, Reduction::from_str_lenient(aggregation))?;
        }
        if let Some(chart_type) = str_arg(args, "chart_type")? {
            data = format_for_chart(data, chart_type);
        }

        Ok(json!({ "data": data, "status": STATUS_SUCCESS }))
    }

    fn open(&self, config: &Value, height: &str) -> ChartResult<Value> {
        let html = render::generate_html(config, height, &self.context.charts.echarts_version)?;
        let ChartFile { path, url } = render::write_chart_file(&html)?;

        let message = if self.context.charts.open_browser {
            render::launch_browser(&url)?;
            "Chart opened in browser"
        } else {
            "Chart written to file"
        };

        Ok(json!({
            "status": STATUS_SUCCESS,
            "message": message,
            "file_path": path.display().to_string(),
            "file_url": url,
        }))
    }

    fn height<'a>(&'a self, args: &'a Map<String, Value>) -> ChartResult<&'a str> {
        Ok(str_arg(args, "height")?.unwrap_or(&self.context.charts.default_height))
    }
}

/// Returns a parameter, or `null` if absent.
fn arg<'a>(args: &'a Map<String, Value>, name: &str) -> &'a Value {
    args.get(name).unwrap_or(&Value::Null)
}

/// Returns an optional string parameter. `null` counts as absent.
fn str_arg<'a>(args: &'a Map<String, Value>, name: &str) -> ChartResult<Option<&'a str>> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(ChartError::invalid_input(format!(
            "parameter '{name}' must be a string"
        ))),
    }
}
