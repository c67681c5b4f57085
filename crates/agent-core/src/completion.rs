//! Completion Wire Contract
//!
//! Request/response shapes of an OpenAI-compatible chat completion service
//! and the parsing of a reply into a [`CompletionOutcome`]. Transports live
//! in `agent-runtime`; everything here is pure.

use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize};

use crate::catalog::CatalogEntry;
use crate::error::{AgentError, Result};
use crate::message::{Message, Role, ToolCallRequest};
use crate::provider::GenerationOptions;

/// What the completion service decided to do next
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// Natural-language answer; ends the run
    Final(String),

    /// One round of tool calls, in the order they must be executed
    ToolCallsRequested {
        /// Text the assistant sent alongside the calls, if any
        content: Option<String>,
        calls: Vec<ToolCallRequest>,
    },
}

impl CompletionOutcome {
    /// The assistant message that records this outcome in a conversation
    pub fn to_message(&self) -> Message {
        match self {
            Self::Final(text) => Message::assistant(text.clone()),
            Self::ToolCallsRequested { content, calls } => {
                Message::assistant_tool_calls(content.clone(), calls.clone())
            }
        }
    }
}

/// Request body for `POST /chat/completions`
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "no_tools")]
    pub tools: &'a [CatalogEntry],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

// Services reject an empty `tools` array, so it is left out instead.
fn no_tools(tools: &&[CatalogEntry]) -> bool {
    tools.is_empty()
}

impl<'a> ChatCompletionRequest<'a> {
    pub fn new(options: &'a GenerationOptions, messages: &[Message], tools: &'a [CatalogEntry]) -> Self {
        Self {
            model: &options.model,
            messages: messages.iter().map(WireMessage::from).collect(),
            tools,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        }
    }
}

/// Message as it travels to and from the completion service
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WireMessage {
    #[serde(default = "assistant_role")]
    pub role: Role,

    #[serde(default)]
    pub content: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<WireToolCall>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

const fn assistant_role() -> Role {
    Role::Assistant
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WireToolCall {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(rename = "type", default = "function_kind")]
    pub kind: String,

    pub function: WireFunctionCall,
}

fn function_kind() -> String {
    "function".into()
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WireFunctionCall {
    pub name: String,

    /// Raw argument text. Some services send an object instead of a string;
    /// it is serialized once and kept as text from then on.
    #[serde(default, deserialize_with = "raw_arguments")]
    pub arguments: String,
}

fn raw_arguments<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(raw) => raw,
        other => other.to_string(),
    })
}

impl From<&Message> for WireMessage {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
            tool_calls: message
                .tool_calls
                .iter()
                .map(|call| WireToolCall {
                    id: Some(call.id.clone()),
                    kind: function_kind(),
                    function: WireFunctionCall {
                        name: call.name.clone(),
                        arguments: call.arguments.clone(),
                    },
                })
                .collect(),
            tool_call_id: message.tool_call_id.clone(),
        }
    }
}

impl WireMessage {
    /// Decode into a validated [`Message`]
    pub fn into_message(self) -> Result<Message> {
        let message = Message {
            role: self.role,
            content: self.content,
            tool_calls: self
                .tool_calls
                .into_iter()
                .map(|call| ToolCallRequest {
                    id: call.id.unwrap_or_default(),
                    name: call.function.name,
                    arguments: call.function.arguments,
                })
                .collect(),
            tool_call_id: self.tool_call_id,
        };
        message.validate()?;
        Ok(message)
    }
}

/// Response body of `POST /chat/completions`; only the first choice is read
#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub message: Option<WireMessage>,
}

impl ChatCompletionResponse {
    pub fn into_outcome(self) -> Result<CompletionOutcome> {
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::MalformedResponse("response contained no choices".into()))?;
        let message = choice
            .message
            .ok_or_else(|| AgentError::MalformedResponse("first choice has no message".into()))?;

        if message.tool_calls.is_empty() {
            return Ok(CompletionOutcome::Final(message.content.unwrap_or_default()));
        }

        let mut seen = HashSet::new();
        let mut calls = Vec::with_capacity(message.tool_calls.len());
        for call in message.tool_calls {
            if call.function.name.is_empty() {
                return Err(AgentError::MalformedResponse("tool call without a function name".into()));
            }
            let id = match call.id {
                Some(id) if !id.is_empty() => id,
                _ => format!("call_{}", uuid::Uuid::new_v4().simple()),
            };
            if !seen.insert(id.clone()) {
                return Err(AgentError::MalformedResponse(format!("duplicate tool call id '{id}'")));
            }
            calls.push(ToolCallRequest {
                id,
                name: call.function.name,
                arguments: call.function.arguments,
            });
        }

        Ok(CompletionOutcome::ToolCallsRequested {
            content: message.content.filter(|text| !text.is_empty()),
            calls,
        })
    }
}

/// Parse a raw response body
pub fn parse_response(body: &str) -> Result<CompletionOutcome> {
    serde_json::from_str::<ChatCompletionResponse>(body)
        .map_err(|e| AgentError::MalformedResponse(e.to_string()))?
        .into_outcome()
}
