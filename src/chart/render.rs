//! Standalone HTML documents for chart options.
//!
//! A document loads ECharts from a version-pinned jsDelivr URL, renders the
//! option into a full-width container and resizes with the window.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde_json::Value;
use tracing::{debug, info};

use crate::chart::error::{ChartError, ChartResult};

/// Default container height.
pub const DEFAULT_HEIGHT: &str = "400px";

/// Default ECharts release loaded by generated documents.
pub const DEFAULT_ECHARTS_VERSION: &str = "5.4.3";

/// Returns the CDN URL for an ECharts release.
#[must_use]
pub fn echarts_cdn_url(version: &str) -> String {
    format!("https://cdn.jsdelivr.net/npm/echarts@{version}/dist/echarts.min.js")
}

/// Renders `config` into a self-contained HTML document.
///
/// # Errors
///
/// Returns an error if `config` cannot be serialised.
pub fn generate_html(config: &Value, height: &str, echarts_version: &str) -> ChartResult<String> {
    // `</` would let string content terminate the script element.
    let option = serde_json::to_string(config)?.replace("</", "<\\/");
    let script_url = echarts_cdn_url(echarts_version);

    Ok(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>ECharts Chart</title>
    <script src="{script_url}"></script>
</head>
<body>
    <div id="chart" style="width: 100%; height: {height};"></div>
    <script>
        var chart = echarts.init(document.getElementById('chart'));
        var option = {option};
        chart.setOption(option);
        window.addEventListener('resize', function() {{
            chart.resize();
        }});
    </script>
</body>
</html>
"#
    ))
}

/// A chart document written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartFile {
    /// Location of the written document.
    pub path: PathBuf,
    /// `file://` URL for the document.
    pub url: String,
}

/// Writes `html` to a new file in the system temp directory and keeps it.
///
/// # Errors
///
/// Returns [`ChartError::Render`] if the file cannot be created or written.
pub fn write_chart_file(html: &str) -> ChartResult<ChartFile> {
    let mut file = tempfile::Builder::new()
        .prefix("echarts-")
        .suffix(".html")
        .tempfile()
        .map_err(|e| render_error(&e))?;
    file.write_all(html.as_bytes()).map_err(|e| render_error(&e))?;

    let (_, path) = file.keep().map_err(|e| render_error(&e.error))?;
    let url = file_url(&path);
    debug!(path = %path.display(), "wrote chart document");

    Ok(ChartFile { path, url })
}

fn file_url(path: &Path) -> String {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
    };
    format!("file://{}", absolute.display())
}

fn render_error(e: &std::io::Error) -> ChartError {
    ChartError::Render {
        message: e.to_string(),
    }
}

/// Opens `url` in the default browser without waiting for it.
///
/// # Errors
///
/// Returns [`ChartError::Render`] if the platform opener cannot be started.
pub fn launch_browser(url: &str) -> ChartResult<()> {
    info!(url, "opening chart in browser");
    opener_command(url)
        .spawn()
        .map(drop)
        .map_err(|e| render_error(&e))
}

#[cfg(target_os = "macos")]
fn opener_command(url: &str) -> Command {
    let mut cmd = Command::new("open");
    cmd.arg(url);
    cmd
}

#[cfg(windows)]
fn opener_command(url: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.args(["/C", "start", ""]).arg(url);
    cmd
}

#[cfg(all(unix, not(target_os = "macos")))]
fn opener_command(url: &str) -> Command {
    let mut cmd = Command::new("xdg-open");
    cmd.arg(url);
    cmd
}
