//! Integration tests for MCP protocol handling.
//!
//! These tests drive a complete server session over in-memory streams:
//! lifecycle, tool listing, tool calls and batches, and protocol errors.

use std::io::Cursor;

use echarts_mcp::config::Config;
use echarts_mcp::mcp::protocol::{parse_message, IncomingMessage, RequestId};
use echarts_mcp::mcp::{McpServer, ToolContext, ToolRegistry, Transport};
use serde_json::{json, Value};
use tokio::io::AsyncReadExt;

/// Runs a session that sends `lines` and returns every message the server wrote.
async fn run_session(lines: &[Value]) -> Vec<Value> {
    let mut input = String::new();
    for line in lines {
        input.push_str(&line.to_string());
        input.push('\n');
    }

    let (mut client, server_side) = tokio::io::duplex(1 << 20);
    let mut config = Config::default();
    config.charts.open_browser = false;
    let registry = ToolRegistry::new(ToolContext::from_config(&config).unwrap());
    let mut server = McpServer::with_transport(
        registry,
        Transport::new(Cursor::new(input.into_bytes()), server_side),
    );

    server.run().await.unwrap();
    drop(server);

    let mut output = String::new();
    client.read_to_string(&mut output).await.unwrap();
    output
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

fn initialize() -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "initialize",
        "params": {
            "protocolVersion": "2024-11-05",
            "capabilities": {},
            "clientInfo": { "name": "test-client", "version": "1.0.0" }
        }
    })
}

fn initialized() -> Value {
    json!({ "jsonrpc": "2.0", "method": "notifications/initialized" })
}

fn tool_text(response: &Value) -> Value {
    let text = response["result"]["content"][0]["text"].as_str().unwrap();
    serde_json::from_str(text).unwrap()
}

// =============================================================================
// Protocol Parsing Tests
// =============================================================================

#[test]
fn test_parse_tools_call_request() {
    let json = r#"{
        "jsonrpc": "2.0",
        "id": "call-1",
        "method": "tools/call",
        "params": { "name": "create_chart", "arguments": { "chart_type": "bar" } }
    }"#;

    let IncomingMessage::Request(req) = parse_message(json).unwrap() else {
        panic!("Expected Request");
    };
    assert_eq!(req.method, "tools/call");
    assert_eq!(req.id, RequestId::String("call-1".to_string()));
}

#[test]
fn test_parse_notification() {
    let json = r#"{ "jsonrpc": "2.0", "method": "notifications/initialized" }"#;
    assert!(matches!(
        parse_message(json).unwrap(),
        IncomingMessage::Notification(_)
    ));
}

// =============================================================================
// Session Tests
// =============================================================================

#[tokio::test]
async fn test_full_session() {
    let responses = run_session(&[
        initialize(),
        initialized(),
        json!({ "jsonrpc": "2.0", "id": 2, "method": "tools/list" }),
        json!({
            "jsonrpc": "2.0",
            "id": 3,
            "method": "tools/call",
            "params": {
                "name": "create_chart",
                "arguments": {
                    "chart_type": "line",
                    "title": "Sales",
                    "data": {
                        "xAxis": ["a", "b", "c"],
                        "series": [{ "name": "s1", "data": [1, 2, 3], "type": "bar" }]
                    }
                }
            }
        }),
        json!({ "jsonrpc": "2.0", "id": 4, "method": "ping" }),
    ])
    .await;

    assert_eq!(responses.len(), 4, "notifications get no response");

    assert_eq!(responses[0]["id"], 1);
    assert_eq!(responses[0]["result"]["protocolVersion"], "2024-11-05");
    assert_eq!(responses[0]["result"]["serverInfo"]["name"], "echarts-mcp");

    let names: Vec<&str> = responses[1]["result"]["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        [
            "generate_echarts_config",
            "create_chart",
            "process_data",
            "aggregate_data",
            "optimize_chart",
            "validate_chart",
            "generate_html",
            "create_and_open_chart",
            "open_chart",
        ]
    );

    let envelope = tool_text(&responses[2]);
    assert_eq!(envelope["status"], "success");
    assert_eq!(envelope["config"]["title"]["text"], "Sales");
    assert_eq!(envelope["config"]["xAxis"]["data"], json!(["a", "b", "c"]));
    assert_eq!(envelope["config"]["series"][0]["type"], "line");

    assert_eq!(responses[3], json!({ "jsonrpc": "2.0", "id": 4, "result": {} }));
}

#[tokio::test]
async fn test_batch_partial_failure() {
    let responses = run_session(&[
        initialize(),
        initialized(),
        json!({
            "jsonrpc": "2.0",
            "id": 2,
            "method": "tools/batch",
            "params": {
                "tools": [
                    { "name": "aggregate_data", "parameters": {
                        "data": { "xAxis": ["q1"], "series": [{ "name": "s", "data": [2, 4], "type": "line" }] },
                        "aggregation": "average"
                    } },
                    { "name": "no_such_tool", "parameters": {} },
                    { "name": "create_chart", "parameters": { "chart_type": "radar" } },
                    { "name": "optimize_chart", "parameters": { "config": { "xAxis": {}, "series": [] } } }
                ]
            }
        }),
    ])
    .await;

    let result = &responses[1]["result"];
    assert_eq!(result["status"], "completed");
    let items = result["tool_responses"].as_array().unwrap();
    assert_eq!(items.len(), 4);

    for (i, item) in items.iter().enumerate() {
        assert_eq!(item["tool_call_id"], format!("tool_{i}"));
    }
    assert_eq!(items[0]["result"]["data"]["series"][0]["data"], json!(3.0));
    assert_eq!(
        items[1]["result"],
        json!({ "error": "unknown tool: no_such_tool", "status": "error" })
    );
    assert_eq!(items[2]["result"]["status"], "error");
    assert_eq!(items[3]["result"]["config"]["tooltip"]["trigger"], "axis");
}

#[tokio::test]
async fn test_tool_error_is_flagged() {
    let responses = run_session(&[
        initialize(),
        initialized(),
        json!({
            "jsonrpc": "2.0",
            "id": 2,
            "method": "tools/call",
            "params": { "name": "process_data", "arguments": { "data": "{ broken" } }
        }),
    ])
    .await;

    assert_eq!(responses[1]["result"]["isError"], true);
    let envelope = tool_text(&responses[1]);
    assert_eq!(envelope["status"], "error");
    assert!(envelope["error"].as_str().unwrap().contains("Invalid JSON"));
}

#[tokio::test]
async fn test_tools_before_initialisation() {
    let responses = run_session(&[json!({ "jsonrpc": "2.0", "id": 9, "method": "tools/list" })]).await;

    assert_eq!(responses[0]["id"], 9);
    assert_eq!(responses[0]["error"]["code"], -32600);
}

#[tokio::test]
async fn test_protocol_errors() {
    let mut responses = run_session(&[initialize(), json!("not a request")]).await;
    let parse_error = responses.pop().unwrap();
    assert_eq!(parse_error["error"]["code"], -32700);
    assert!(parse_error.get("id").is_none());

    let responses = run_session(&[
        initialize(),
        json!({ "jsonrpc": "2.0", "id": 2, "method": "charts/draw" }),
    ])
    .await;
    assert_eq!(responses[1]["error"]["code"], -32601);
}

// =============================================================================
// Registry Tests
// =============================================================================

#[test]
fn test_registry_dispatch_blocking() {
    let mut config = Config::default();
    config.charts.open_browser = false;
    let registry = ToolRegistry::new(ToolContext::from_config(&config).unwrap());

    let result = tokio_test::block_on(registry.dispatch(
        "process_data",
        &json!({ "data": { "data": [{ "name": "a", "value": 1 }, { "name": "b" }] }, "chart_type": "pie" }),
    ));

    assert_eq!(result["status"], "success");
    assert_eq!(result["data"], json!({ "data": [{ "name": "a", "value": 1 }] }));
}
