//! MCP Tool Provider
//!
//! Implements `ToolProvider` by talking to an external MCP (Model Context
//! Protocol) server over stdio: newline-delimited JSON-RPC 2.0.

use std::process::Stdio;
use std::time::Duration;

use agent_core::{
    error::{AgentError, Result},
    tool::{ToolArguments, ToolDescriptor, ToolProvider, ToolResult},
};
use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::{parse_var, seconds};

/// Protocol revision sent in `initialize`
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// MCP server launch configuration
#[derive(Clone, Debug)]
pub struct McpConfig {
    /// Executable to spawn
    pub command: String,

    /// Arguments passed to the executable
    pub args: Vec<String>,

    /// Upper bound for a single request
    pub call_timeout: Duration,
}

impl McpConfig {
    /// `None` when `MCP_SERVER_COMMAND` is unset
    pub fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Option<Self>> {
        let Some(command) = lookup("MCP_SERVER_COMMAND").filter(|c| !c.trim().is_empty()) else {
            return Ok(None);
        };

        Ok(Some(Self {
            command: command.trim().to_string(),
            args: parse_var(lookup, "MCP_SERVER_ARGS", String::new())?
                .split_whitespace()
                .map(String::from)
                .collect(),
            call_timeout: seconds(lookup, "MCP_CALL_TIMEOUT_SECS", 30)?,
        }))
    }
}

type Reader = BufReader<Box<dyn AsyncRead + Send + Unpin>>;
type Writer = Box<dyn AsyncWrite + Send + Unpin>;

/// A JSON-RPC session over a pair of byte streams
struct McpConnection {
    reader: Reader,
    writer: Writer,
    child: Option<Child>,
    next_id: i64,
    /// Set while a request is on the wire; still set if one was abandoned
    in_flight: bool,
}

impl McpConnection {
    fn new(reader: Box<dyn AsyncRead + Send + Unpin>, writer: Writer, child: Option<Child>) -> Self {
        Self {
            reader: BufReader::new(reader),
            writer,
            child,
            next_id: 1,
            in_flight: false,
        }
    }

    fn next_request_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Check if the server process is still running
    fn is_alive(&mut self) -> bool {
        self.child
            .as_mut()
            .is_none_or(|child| matches!(child.try_wait(), Ok(None)))
    }

    async fn write_frame(&mut self, frame: &serde_json::Value) -> Result<()> {
        let line = format!("{}\n", serde_json::to_string(frame)?);
        self.writer
            .write_all(line.as_bytes())
            .await
            .map_err(|e| AgentError::Transport(format!("write to MCP server failed: {e}")))?;
        self.writer
            .flush()
            .await
            .map_err(|e| AgentError::Transport(format!("write to MCP server failed: {e}")))
    }

    /// Send a request and wait for the response with the same id
    async fn request(&mut self, method: &str, params: serde_json::Value) -> Result<serde_json::Value> {
        let id = self.next_request_id();
        self.in_flight = true;
        self.write_frame(&serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        }))
        .await?;

        let frame = self.read_response(id).await?;
        self.in_flight = false;

        if let Some(error) = frame.get("error") {
            let message = error
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown error");
            return Err(AgentError::ToolExecution(format!("MCP {method} failed: {message}")));
        }

        frame
            .get("result")
            .cloned()
            .ok_or_else(|| AgentError::MalformedResponse(format!("MCP {method} response has no result")))
    }

    async fn read_response(&mut self, id: i64) -> Result<serde_json::Value> {
        loop {
            let mut line = String::new();
            let read = self
                .reader
                .read_line(&mut line)
                .await
                .map_err(|e| AgentError::Transport(format!("read from MCP server failed: {e}")))?;
            if read == 0 {
                return Err(AgentError::Transport("MCP server closed the connection".into()));
            }

            let frame: serde_json::Value = match serde_json::from_str(line.trim()) {
                Ok(frame) => frame,
                Err(_) => {
                    debug!(line = line.trim(), "Skipping non-JSON output from MCP server");
                    continue;
                }
            };

            if frame.get("id").and_then(serde_json::Value::as_i64) == Some(id) {
                return Ok(frame);
            }
            // notification or server-initiated request
        }
    }

    async fn notify(&mut self, method: &str) -> Result<()> {
        self.write_frame(&serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": {},
        }))
        .await
    }

    async fn initialize(&mut self) -> Result<serde_json::Value> {
        let result = self
            .request(
                "initialize",
                serde_json::json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": {},
                    "clientInfo": {
                        "name": env!("CARGO_PKG_NAME"),
                        "version": env!("CARGO_PKG_VERSION"),
                    }
                }),
            )
            .await?;
        self.notify("notifications/initialized").await?;
        Ok(result)
    }
}

#[derive(Deserialize)]
struct ListToolsResult {
    #[serde(default)]
    tools: Vec<ToolDescriptor>,
}

/// Tool provider backed by an MCP server
pub struct McpToolProvider {
    connection: Mutex<McpConnection>,
    server_name: String,
    call_timeout: Duration,
}

impl McpToolProvider {
    /// Spawn the configured server and perform the initialize handshake
    pub async fn spawn(config: &McpConfig) -> Result<Self> {
        info!(command = %config.command, "Spawning MCP server");

        let mut child = Command::new(&config.command)
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| AgentError::Transport(format!("failed to spawn MCP server '{}': {e}", config.command)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| AgentError::Transport("MCP server stdin unavailable".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AgentError::Transport("MCP server stdout unavailable".into()))?;

        Self::handshake(
            McpConnection::new(Box::new(stdout), Box::new(stdin), Some(child)),
            config.call_timeout,
        )
        .await
    }

    /// Connect over arbitrary streams (in-process servers, sockets)
    pub async fn from_streams(
        reader: impl AsyncRead + Send + Unpin + 'static,
        writer: impl AsyncWrite + Send + Unpin + 'static,
        call_timeout: Duration,
    ) -> Result<Self> {
        Self::handshake(McpConnection::new(Box::new(reader), Box::new(writer), None), call_timeout).await
    }

    async fn handshake(mut connection: McpConnection, call_timeout: Duration) -> Result<Self> {
        let result = tokio::time::timeout(call_timeout, connection.initialize())
            .await
            .map_err(|_| AgentError::Transport("MCP initialize timed out".into()))??;

        let server_name = result
            .pointer("/serverInfo/name")
            .and_then(|n| n.as_str())
            .unwrap_or("mcp")
            .to_string();
        info!(server = %server_name, "MCP server connected");

        Ok(Self {
            connection: Mutex::new(connection),
            server_name,
            call_timeout,
        })
    }

    /// Name the server reported during initialize
    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    async fn request(&self, method: &str, params: serde_json::Value) -> Result<serde_json::Value> {
        let mut connection = self.connection.lock().await;

        if !connection.is_alive() {
            warn!(server = %self.server_name, "MCP server has exited");
            return Err(AgentError::Transport(format!("MCP server '{}' has exited", self.server_name)));
        }

        // a half-written frame or an unread reply may still be on the wire
        if connection.in_flight {
            return Err(AgentError::Transport(format!(
                "MCP connection to '{}' was interrupted mid-request",
                self.server_name
            )));
        }

        tokio::time::timeout(self.call_timeout, connection.request(method, params))
            .await
            .map_err(|_| {
                AgentError::Transport(format!("MCP {method} timed out after {:?}", self.call_timeout))
            })?
    }

    /// Kill the server process, if this provider spawned one
    pub async fn shutdown(&self) {
        let mut connection = self.connection.lock().await;
        if let Some(child) = connection.child.as_mut() {
            info!(server = %self.server_name, "Shutting down MCP server");
            child.kill().await.ok();
        }
    }
}

#[async_trait]
impl ToolProvider for McpToolProvider {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>> {
        let result = self.request("tools/list", serde_json::json!({})).await?;
        let listed: ListToolsResult = serde_json::from_value(result)
            .map_err(|e| AgentError::MalformedResponse(format!("tools/list: {e}")))?;
        Ok(listed.tools)
    }

    async fn call_tool(&self, name: &str, arguments: ToolArguments) -> Result<ToolResult> {
        let result = self
            .request(
                "tools/call",
                serde_json::json!({ "name": name, "arguments": arguments }),
            )
            .await?;
        serde_json::from_value(result).map_err(|e| AgentError::ToolExecution(format!("unreadable result from {name}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{duplex, split};

    /// Scripted MCP server on the far end of an in-memory pipe
    fn fake_server(stream: tokio::io::DuplexStream) {
        tokio::spawn(async move {
            let (read, mut write) = split(stream);
            let mut lines = BufReader::new(read).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let frame: serde_json::Value = serde_json::from_str(&line).unwrap();
                let Some(id) = frame.get("id").cloned() else {
                    continue;
                };
                let result = match frame["method"].as_str().unwrap() {
                    "initialize" => serde_json::json!({
                        "protocolVersion": PROTOCOL_VERSION,
                        "serverInfo": {"name": "fake-tools"},
                        "capabilities": {"tools": {}}
                    }),
                    "tools/list" => serde_json::json!({"tools": [
                        {"name": "GetTime", "description": "Current time", "inputSchema": {"type": "object"}},
                        {"name": "Bare", "description": "No schema"}
                    ]}),
                    "tools/call" if frame["params"]["name"] == "GetTime" => serde_json::json!({
                        "content": [{"type": "text", "text": "2026-10-18T09:30:00Z"}],
                        "isError": false
                    }),
                    "tools/call" if frame["params"]["name"] == "Slow" => {
                        tokio::time::sleep(Duration::from_secs(60)).await;
                        serde_json::json!({})
                    }
                    _ => {
                        let error = serde_json::json!({
                            "jsonrpc": "2.0", "id": id,
                            "error": {"code": -32602, "message": "Unknown tool"}
                        });
                        write.write_all(format!("{error}\n").as_bytes()).await.unwrap();
                        continue;
                    }
                };
                // a notification first, which the client must skip
                write
                    .write_all(b"{\"jsonrpc\":\"2.0\",\"method\":\"notifications/progress\"}\n")
                    .await
                    .unwrap();
                let reply = serde_json::json!({"jsonrpc": "2.0", "id": id, "result": result});
                write.write_all(format!("{reply}\n").as_bytes()).await.unwrap();
            }
        });
    }

    async fn connect(call_timeout: Duration) -> McpToolProvider {
        let (client, server) = duplex(64 * 1024);
        fake_server(server);
        let (read, write) = split(client);
        McpToolProvider::from_streams(read, write, call_timeout).await.unwrap()
    }

    #[test]
    fn test_config_from_lookup() {
        assert!(McpConfig::from_lookup(&|_: &str| None).unwrap().is_none());

        let config = McpConfig::from_lookup(&|key: &str| match key {
            "MCP_SERVER_COMMAND" => Some("mcp-tool-server".into()),
            "MCP_SERVER_ARGS" => Some("--root  /srv/data".into()),
            "MCP_CALL_TIMEOUT_SECS" => Some("5".into()),
            _ => None,
        })
        .unwrap()
        .unwrap();

        assert_eq!(config.command, "mcp-tool-server");
        assert_eq!(config.args, vec!["--root", "/srv/data"]);
        assert_eq!(config.call_timeout, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_handshake_and_list_tools() {
        let provider = connect(Duration::from_secs(5)).await;
        assert_eq!(provider.server_name(), "fake-tools");

        let tools = provider.list_tools().await.unwrap();
        assert_eq!(tools.len(), 2);
        assert_eq!(tools[0].input_schema, Some(serde_json::json!({"type": "object"})));
        assert!(tools[1].input_schema.is_none());
    }

    #[tokio::test]
    async fn test_call_tool() {
        let provider = connect(Duration::from_secs(5)).await;
        let result = provider.call_tool("GetTime", ToolArguments::new()).await.unwrap();
        assert!(!result.is_error);
        assert_eq!(result.flatten_text(), "2026-10-18T09:30:00Z");
    }

    #[tokio::test]
    async fn test_rpc_error_is_tool_failure() {
        let provider = connect(Duration::from_secs(5)).await;
        let err = provider.call_tool("Missing", ToolArguments::new()).await.unwrap_err();
        assert!(matches!(err, AgentError::ToolExecution(msg) if msg.contains("Unknown tool")));
    }

    #[tokio::test]
    async fn test_call_timeout() {
        let provider = connect(Duration::from_millis(50)).await;
        let err = provider.call_tool("Slow", ToolArguments::new()).await.unwrap_err();
        assert!(matches!(err, AgentError::Transport(msg) if msg.contains("timed out")));
    }

    #[tokio::test]
    async fn test_timed_out_call_retires_the_connection() {
        let provider = connect(Duration::from_millis(50)).await;
        provider.call_tool("Slow", ToolArguments::new()).await.unwrap_err();

        let next = tokio::time::timeout(Duration::from_secs(1), provider.call_tool("GetTime", ToolArguments::new()))
            .await
            .unwrap();
        assert!(matches!(next, Err(AgentError::Transport(msg)) if msg.contains("interrupted")));
    }

    #[tokio::test]
    async fn test_rpc_error_keeps_connection_usable() {
        let provider = connect(Duration::from_secs(5)).await;
        provider.call_tool("Missing", ToolArguments::new()).await.unwrap_err();
        let result = provider.call_tool("GetTime", ToolArguments::new()).await.unwrap();
        assert_eq!(result.flatten_text(), "2026-10-18T09:30:00Z");
    }

    #[tokio::test]
    async fn test_closed_connection() {
        let (client, server) = duplex(1024);
        drop(server);
        let (read, write) = split(client);
        let result = McpToolProvider::from_streams(read, write, Duration::from_secs(1)).await;
        assert!(matches!(result, Err(AgentError::Transport(_))));
    }
}
