//! Tool Invocation Executor
//!
//! Runs one tool call against the [`ToolProvider`] and always produces a
//! `tool` message, so a failing call never aborts a round.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{AgentError, Result};
use crate::message::{Message, ToolCallRequest};
use crate::tool::{ToolArguments, ToolProvider};

pub struct ToolExecutor {
    provider: Arc<dyn ToolProvider>,
}

impl ToolExecutor {
    pub fn new(provider: Arc<dyn ToolProvider>) -> Self {
        Self { provider }
    }

    /// Execute a tool call, converting every failure into message text
    pub async fn execute(&self, request: &ToolCallRequest) -> Message {
        let arguments = match parse_arguments(&request.arguments) {
            Ok(arguments) => arguments,
            Err(e) => {
                warn!(tool = %request.name, call_id = %request.id, error = %e, "Rejected tool arguments");
                return Message::tool(
                    &request.id,
                    format!("Error: invalid arguments for tool '{}': {e}", request.name),
                );
            }
        };

        debug!(tool = %request.name, call_id = %request.id, "Executing tool");

        let content = match self.provider.call_tool(&request.name, arguments).await {
            Ok(result) => {
                if result.is_error {
                    warn!(tool = %request.name, call_id = %request.id, "Tool reported an error");
                }
                result.flatten_text()
            }
            Err(e) => {
                warn!(tool = %request.name, call_id = %request.id, error = %e, "Tool invocation failed");
                format!("Error: tool '{}' could not be executed: {e}", request.name)
            }
        };

        Message::tool(&request.id, content)
    }
}

/// Parse a raw argument payload; blank or `null` means no arguments
pub fn parse_arguments(raw: &str) -> Result<ToolArguments> {
    if raw.trim().is_empty() {
        return Ok(ToolArguments::new());
    }

    match serde_json::from_str::<serde_json::Value>(raw)? {
        serde_json::Value::Object(map) => Ok(map),
        serde_json::Value::Null => Ok(ToolArguments::new()),
        other => Err(AgentError::ToolValidation(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}
