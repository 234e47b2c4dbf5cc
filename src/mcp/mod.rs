//! Model Context Protocol (MCP) server.
//!
//! Exposes the chart pipeline as MCP tools over newline-delimited JSON-RPC 2.0
//! on stdio.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         MCP Server                          │
//! │                                                             │
//! │   ┌─────────────┐    ┌─────────────┐    ┌─────────────┐    │
//! │   │  Transport  │───▶│   Server    │───▶│   Tools     │    │
//! │   │   (stdio)   │    │  (lifecycle)│    │  (registry) │    │
//! │   └─────────────┘    └─────────────┘    └──────┬──────┘    │
//! │                                                │            │
//! │                                                ▼            │
//! │                                    chart pipeline / LLM     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Besides the standard `tools/call`, the server accepts a `tools/batch`
//! request that runs several tool calls and returns one result per call.
//!
//! # Protocol Version
//!
//! This implementation targets MCP protocol version 2024-11-05.

pub mod protocol;
pub mod server;
pub mod tools;
pub mod transport;

pub use protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, MCP_PROTOCOL_VERSION};
pub use server::McpServer;
pub use tools::{ToolContext, ToolRegistry};
pub use transport::Transport;
