//! JSON-RPC 2.0 framing for the chart server.
//!
//! Every line on stdin is one message. A message with an `id` is a request and
//! gets exactly one response or error back; a message without one is a
//! notification and gets nothing.
//!
//! JSON-RPC errors are reserved for the protocol layer: unparseable lines,
//! unknown methods, calls before initialisation and params that do not match
//! the method. A chart tool that fails, inside `tools/call` or inside any entry
//! of `tools/batch`, still produces a successful response whose payload is an
//! `{"error": ..., "status": "error"}` envelope.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// MCP revision spoken by this server.
pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

/// Name reported in `serverInfo`.
pub const SERVER_NAME: &str = "echarts-mcp";

const JSONRPC_VERSION: &str = "2.0";

/// Request identifier. `null` is not accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// Integer ID.
    Number(i64),
    /// String ID.
    String(String),
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

/// An incoming request.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: RequestId,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// Returns the reason this request is malformed, if it is.
    #[must_use]
    pub fn validate(&self) -> Option<&'static str> {
        if self.jsonrpc != JSONRPC_VERSION {
            Some("jsonrpc field must be \"2.0\"")
        } else if self.method.is_empty() {
            Some("method field cannot be empty")
        } else {
            None
        }
    }
}

/// An incoming notification such as `notifications/initialized`.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

/// A successful response. For `tools/call` the result is a content block
/// list; for `tools/batch` it is `{tool_responses, status: "completed"}`.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    pub id: RequestId,
    pub result: Value,
}

impl JsonRpcResponse {
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result,
        }
    }
}

/// Protocol error codes this server emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorCode {
    /// The line was not a JSON object.
    ParseError = -32700,
    /// Not a valid request, or not valid in the current lifecycle state.
    InvalidRequest = -32600,
    /// Unknown method.
    MethodNotFound = -32601,
    /// `initialize`, `tools/call` or `tools/batch` params did not deserialise.
    InvalidParams = -32602,
    /// A result could not be serialised.
    InternalError = -32603,
}

impl ErrorCode {
    /// Returns the numeric code.
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Returns the stock message for this code.
    #[must_use]
    pub const fn default_message(self) -> &'static str {
        match self {
            Self::ParseError => "Parse error",
            Self::InvalidRequest => "Invalid Request",
            Self::MethodNotFound => "Method not found",
            Self::InvalidParams => "Invalid params",
            Self::InternalError => "Internal error",
        }
    }
}

/// The `error` member of an error response.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcErrorData {
    pub code: i32,
    pub message: String,
}

impl JsonRpcErrorData {
    /// Error with the stock message for `code`.
    #[must_use]
    pub fn from_code(code: ErrorCode) -> Self {
        Self::with_message(code, code.default_message())
    }

    /// Error with a custom message.
    #[must_use]
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.code(),
            message: message.into(),
        }
    }
}

/// An error response. `id` is omitted when the request could not be read.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcError {
    pub jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,
    pub error: JsonRpcErrorData,
}

impl JsonRpcError {
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn new(id: Option<RequestId>, error: JsonRpcErrorData) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            error,
        }
    }

    #[must_use]
    pub fn parse_error() -> Self {
        Self::new(None, JsonRpcErrorData::from_code(ErrorCode::ParseError))
    }

    #[must_use]
    pub fn invalid_request(id: Option<RequestId>) -> Self {
        Self::new(id, JsonRpcErrorData::from_code(ErrorCode::InvalidRequest))
    }

    /// A second `initialize` on a session that already has one.
    #[must_use]
    pub fn already_initialised(id: RequestId) -> Self {
        Self::new(
            Some(id),
            JsonRpcErrorData::with_message(ErrorCode::InvalidRequest, "Server already initialised"),
        )
    }

    /// A tool method before `notifications/initialized` arrived.
    #[must_use]
    pub fn not_initialised(id: RequestId) -> Self {
        Self::new(
            Some(id),
            JsonRpcErrorData::with_message(ErrorCode::InvalidRequest, "Server not initialised"),
        )
    }

    #[must_use]
    pub fn method_not_found(id: RequestId, method: &str) -> Self {
        Self::new(
            Some(id),
            JsonRpcErrorData::with_message(
                ErrorCode::MethodNotFound,
                format!("Method not found: {method}"),
            ),
        )
    }

    /// Params missing or of the wrong shape, e.g. a `tools/batch` without a `tools` array.
    #[must_use]
    pub fn invalid_params(id: RequestId, message: impl Into<String>) -> Self {
        Self::new(
            Some(id),
            JsonRpcErrorData::with_message(ErrorCode::InvalidParams, message),
        )
    }

    #[must_use]
    pub fn internal_error(id: RequestId, message: impl Into<String>) -> Self {
        Self::new(
            Some(id),
            JsonRpcErrorData::with_message(ErrorCode::InternalError, message),
        )
    }
}

/// One decoded line: a request or a notification.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IncomingMessage {
    Request(JsonRpcRequest),
    Notification(JsonRpcNotification),
}

impl IncomingMessage {
    #[must_use]
    pub fn method(&self) -> &str {
        match self {
            Self::Request(req) => &req.method,
            Self::Notification(notif) => &notif.method,
        }
    }

    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn params(&self) -> Option<&Value> {
        match self {
            Self::Request(req) => req.params.as_ref(),
            Self::Notification(notif) => notif.params.as_ref(),
        }
    }

    /// Returns the ID for requests, `None` for notifications.
    #[must_use]
    pub const fn id(&self) -> Option<&RequestId> {
        match self {
            Self::Request(req) => Some(&req.id),
            Self::Notification(_) => None,
        }
    }
}

/// Decodes one line of input.
///
/// # Errors
///
/// Returns a parse error for anything that is not a JSON object, and an
/// invalid-request error for objects that are not JSON-RPC 2.0 messages.
pub fn parse_message(line: &str) -> Result<IncomingMessage, JsonRpcError> {
    let value: Value = serde_json::from_str(line).map_err(|_| JsonRpcError::parse_error())?;
    let obj = value.as_object().ok_or_else(JsonRpcError::parse_error)?;

    if obj.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION) {
        return Err(JsonRpcError::invalid_request(None));
    }

    // `id` present means request, even when its value turns out to be invalid.
    if !obj.contains_key("id") {
        return serde_json::from_value(value)
            .map(IncomingMessage::Notification)
            .map_err(|_| JsonRpcError::invalid_request(None));
    }

    let request: JsonRpcRequest =
        serde_json::from_value(value).map_err(|_| JsonRpcError::invalid_request(None))?;
    if request.validate().is_some() {
        return Err(JsonRpcError::invalid_request(Some(request.id)));
    }
    Ok(IncomingMessage::Request(request))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(line: &str) -> JsonRpcRequest {
        match parse_message(line).unwrap() {
            IncomingMessage::Request(req) => req,
            IncomingMessage::Notification(n) => panic!("expected request, got {}", n.method),
        }
    }

    #[test]
    fn numeric_and_string_ids() {
        let req = request(r#"{"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}"#);
        assert_eq!(req.id, RequestId::Number(1));
        assert_eq!(req.method, "initialize");

        let req = request(r#"{"jsonrpc": "2.0", "id": "abc-123", "method": "ping"}"#);
        assert_eq!(req.id, RequestId::String("abc-123".to_string()));
        assert_eq!(req.id.to_string(), "abc-123");
    }

    #[test]
    fn notification_has_no_id() {
        let msg = parse_message(r#"{"jsonrpc": "2.0", "method": "notifications/initialized"}"#)
            .unwrap();
        assert_eq!(msg.method(), "notifications/initialized");
        assert!(msg.id().is_none());
    }

    #[test]
    fn batch_request_keeps_params() {
        let json = r#"{"jsonrpc":"2.0","id":7,"method":"tools/batch","params":{"tools":[]}}"#;
        let msg = parse_message(json).unwrap();
        assert_eq!(msg.method(), "tools/batch");
        assert_eq!(msg.id(), Some(&RequestId::Number(7)));
        assert_eq!(msg.params(), Some(&json!({ "tools": [] })));
    }

    #[test]
    fn unreadable_lines_are_parse_errors() {
        for line in ["not valid json", "[1, 2]", "\"text\""] {
            let err = parse_message(line).unwrap_err();
            assert_eq!(err.error.code, -32700, "{line}");
            assert!(err.id.is_none());
        }
    }

    #[test]
    fn wrong_or_missing_version_is_invalid_request() {
        for line in [
            r#"{"id": 1, "method": "ping"}"#,
            r#"{"jsonrpc": "1.0", "id": 1, "method": "ping"}"#,
            r#"{"jsonrpc": "2.0", "id": null, "method": "ping"}"#,
        ] {
            let err = parse_message(line).unwrap_err();
            assert_eq!(err.error.code, ErrorCode::InvalidRequest.code(), "{line}");
        }
    }

    #[test]
    fn empty_method_keeps_request_id() {
        let err = parse_message(r#"{"jsonrpc": "2.0", "id": 3, "method": ""}"#).unwrap_err();
        assert_eq!(err.id, Some(RequestId::Number(3)));
    }

    #[test]
    fn success_response_shape() {
        let response = JsonRpcResponse::success(RequestId::Number(1), json!({ "ok": true }));
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({ "jsonrpc": "2.0", "id": 1, "result": { "ok": true } })
        );
    }

    #[test]
    fn error_response_shapes() {
        let err = JsonRpcError::method_not_found(RequestId::Number(1), "charts/draw");
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": { "code": -32601, "message": "Method not found: charts/draw" }
            })
        );

        let err = JsonRpcError::not_initialised(RequestId::String("x".to_string()));
        assert_eq!(err.error.code, -32600);
        assert_eq!(err.error.message, "Server not initialised");

        let err = JsonRpcError::invalid_params(RequestId::Number(2), "Missing batch params");
        assert_eq!(err.error.code, -32602);
    }
}
