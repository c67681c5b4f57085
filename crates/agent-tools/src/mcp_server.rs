//! MCP stdio server
//!
//! Serves any [`ToolProvider`] as a Model Context Protocol server speaking
//! newline-delimited JSON-RPC 2.0.

use std::sync::Arc;

use agent_core::{AgentError, ToolArguments, ToolProvider, ToolResult};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

pub const PROTOCOL_VERSION: &str = "2024-11-05";

const PARSE_ERROR: i64 = -32700;
const INVALID_REQUEST: i64 = -32600;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;
const INTERNAL_ERROR: i64 = -32603;

struct RpcError {
    code: i64,
    message: String,
}

impl RpcError {
    fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

pub struct McpServer {
    tools: Arc<dyn ToolProvider>,
    name: String,
    version: String,
}

impl McpServer {
    pub fn new(tools: Arc<dyn ToolProvider>) -> Self {
        Self {
            tools,
            name: env!("CARGO_PKG_NAME").into(),
            version: env!("CARGO_PKG_VERSION").into(),
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Handle one inbound line; `None` means no reply is due (notifications)
    pub async fn handle_line(&self, line: &str) -> Option<Value> {
        let frame: Value = match serde_json::from_str(line) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "Unparseable JSON-RPC frame");
                return Some(error_frame(&Value::Null, &RpcError::new(PARSE_ERROR, e.to_string())));
            }
        };

        let id = frame.get("id").cloned()?;
        let Some(method) = frame.get("method").and_then(Value::as_str) else {
            return Some(error_frame(&id, &RpcError::new(INVALID_REQUEST, "missing method")));
        };
        let params = frame.get("params").cloned().unwrap_or(Value::Null);

        debug!(method, "MCP request");
        let reply = match self.dispatch(method, params).await {
            Ok(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
            Err(e) => error_frame(&id, &e),
        };
        Some(reply)
    }

    async fn dispatch(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        match method {
            "initialize" => Ok(json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": { "tools": {} },
                "serverInfo": { "name": self.name, "version": self.version },
            })),
            "ping" => Ok(json!({})),
            "tools/list" => {
                let tools = self
                    .tools
                    .list_tools()
                    .await
                    .map_err(|e| RpcError::new(INTERNAL_ERROR, e.to_string()))?;
                Ok(json!({ "tools": tools }))
            }
            "tools/call" => self.call_tool(params).await,
            other => Err(RpcError::new(METHOD_NOT_FOUND, format!("Method not found: {other}"))),
        }
    }

    async fn call_tool(&self, params: Value) -> Result<Value, RpcError> {
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| RpcError::new(INVALID_PARAMS, "missing tool name"))?;
        let arguments: ToolArguments = match params.get("arguments") {
            None | Some(Value::Null) => ToolArguments::new(),
            Some(Value::Object(map)) => map.clone(),
            Some(_) => return Err(RpcError::new(INVALID_PARAMS, "arguments must be an object")),
        };

        let result = match self.tools.call_tool(name, arguments).await {
            Ok(result) => result,
            Err(AgentError::ToolNotFound(name)) => {
                return Err(RpcError::new(INVALID_PARAMS, format!("Unknown tool: {name}")));
            }
            Err(e) => ToolResult::failure(e.to_string()),
        };

        serde_json::to_value(result).map_err(|e| RpcError::new(INTERNAL_ERROR, e.to_string()))
    }

    /// Serve requests until the reader reaches end of input
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!(server = %self.name, "MCP server ready");
        let mut lines = BufReader::new(reader).lines();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            if let Some(reply) = self.handle_line(line.trim()).await {
                writer.write_all(format!("{reply}\n").as_bytes()).await?;
                writer.flush().await?;
            }
        }

        info!("Client disconnected");
        Ok(())
    }
}

fn error_frame(id: &Value, error: &RpcError) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": error.code, "message": error.message },
    })
}
