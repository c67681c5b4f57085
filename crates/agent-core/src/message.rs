//! Conversation Messages
//!
//! Standard message format used across the agent system, plus the
//! append-only [`Conversation`] the orchestration loop owns during a run.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{AgentError, Result};

/// Role of a message sender
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System prompt/instructions
    System,
    /// User input
    User,
    /// Assistant (LLM) response
    Assistant,
    /// Tool result correlated to an assistant tool call
    Tool,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
            Self::Tool => write!(f, "tool"),
        }
    }
}

/// Tool call request emitted by the completion service
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Correlation token echoed back on the answering `tool` message
    pub id: String,

    /// Tool identifier
    pub name: String,

    /// Arguments exactly as the completion service produced them
    #[serde(default)]
    pub arguments: String,
}

impl ToolCallRequest {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}

/// A single message in a conversation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Message role
    pub role: Role,

    /// Text content, absent only on a pure tool-call assistant turn
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Requested tool calls (assistant only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,

    /// Correlation id (tool only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    fn text(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::text(Role::System, content)
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::text(Role::User, content)
    }

    /// Create a final assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::text(Role::Assistant, content)
    }

    /// Create an assistant message that requests tool execution
    pub fn assistant_tool_calls(content: Option<String>, tool_calls: Vec<ToolCallRequest>) -> Self {
        Self {
            role: Role::Assistant,
            content,
            tool_calls,
            tool_call_id: None,
        }
    }

    /// Create a tool result message
    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    /// Text content, or the empty string when absent
    pub fn content_str(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }

    /// True iff this is an assistant message with no pending tool calls
    pub fn is_final(&self) -> bool {
        self.role == Role::Assistant && self.tool_calls.is_empty()
    }

    /// True iff this is an assistant message that asks for a tool round
    pub fn requires_tool_round(&self) -> bool {
        self.role == Role::Assistant && !self.tool_calls.is_empty()
    }

    /// Check the role-dependent shape rules
    pub fn validate(&self) -> Result<()> {
        let malformed = |msg: String| Err(AgentError::MalformedMessage(msg));

        if self.role != Role::Assistant && !self.tool_calls.is_empty() {
            return malformed(format!("{} message cannot carry tool calls", self.role));
        }

        match self.role {
            Role::Tool => match self.tool_call_id.as_deref() {
                Some(id) if !id.is_empty() => Ok(()),
                _ => malformed("tool message is missing its tool_call_id".into()),
            },
            _ if self.tool_call_id.is_some() => {
                malformed(format!("{} message cannot carry a tool_call_id", self.role))
            }
            Role::System | Role::User if self.content.is_none() => {
                malformed(format!("{} message requires content", self.role))
            }
            Role::Assistant if self.content.is_none() && self.tool_calls.is_empty() => {
                malformed("assistant message has neither content nor tool calls".into())
            }
            Role::Assistant => {
                let mut seen = HashSet::new();
                for call in &self.tool_calls {
                    if call.id.is_empty() {
                        return malformed(format!("tool call '{}' has an empty id", call.name));
                    }
                    if !seen.insert(call.id.as_str()) {
                        return malformed(format!("duplicate tool call id '{}'", call.id));
                    }
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

/// Append-only conversation history
///
/// Messages are never removed or edited once appended. Every tool call in an
/// assistant turn must be answered by exactly one `tool` message before any
/// other message can follow.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_system_prompt(prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(prompt)],
        }
    }

    /// Add a message, enforcing shape and tool-call correlation
    pub fn append(&mut self, message: Message) -> Result<()> {
        message.validate()?;

        let pending = self.pending_tool_calls();
        match message.tool_call_id.as_deref() {
            Some(id) if message.role == Role::Tool => {
                if !pending.iter().any(|call| call.id == id) {
                    return Err(AgentError::MalformedMessage(format!(
                        "tool message answers unknown or already answered call '{id}'"
                    )));
                }
            }
            _ if !pending.is_empty() => {
                return Err(AgentError::MalformedMessage(format!(
                    "{} tool call(s) still unanswered",
                    pending.len()
                )));
            }
            _ => {}
        }

        self.messages.push(message);
        Ok(())
    }

    /// Tool calls of the latest assistant turn that have no answer yet, in request order
    pub fn pending_tool_calls(&self) -> Vec<&ToolCallRequest> {
        let mut answered = HashSet::new();
        for message in self.messages.iter().rev() {
            match message.role {
                Role::Tool => {
                    if let Some(id) = message.tool_call_id.as_deref() {
                        answered.insert(id);
                    }
                }
                Role::Assistant => {
                    return message
                        .tool_calls
                        .iter()
                        .filter(|call| !answered.contains(call.id.as_str()))
                        .collect();
                }
                Role::System | Role::User => break,
            }
        }
        Vec::new()
    }

    /// Get all messages
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Get the last message
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Number of messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
