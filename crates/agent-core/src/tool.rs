//! Tool System
//!
//! The [`ToolProvider`] seam the orchestration loop talks to, and a local
//! provider ([`ToolRegistry`]) built from in-process [`Tool`] implementations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{AgentError, Result};

/// Parsed tool arguments (always a JSON object)
pub type ToolArguments = serde_json::Map<String, serde_json::Value>;

/// Text used when an error result carries no text of its own
pub const EMPTY_ERROR_PLACEHOLDER: &str = "The tool reported an error but returned no details.";

/// Tool descriptor as discovered from a provider
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    /// Unique tool identifier within a catalog
    pub name: String,

    /// Human-readable description (shown to LLM)
    #[serde(default)]
    pub description: String,

    /// JSON Schema of accepted arguments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<serde_json::Value>,
}

/// One block of tool output
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBlock {
    /// Block kind ("text", "image", ...)
    #[serde(rename = "type", default = "default_block_kind")]
    pub kind: String,

    /// Text payload, if the block has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

fn default_block_kind() -> String {
    "text".into()
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: default_block_kind(),
            text: Some(text.into()),
        }
    }
}

/// Result from tool execution
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    /// Whether the tool signalled an error
    #[serde(default)]
    pub is_error: bool,

    /// Ordered output blocks
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

impl ToolResult {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            is_error: false,
            content: vec![ContentBlock::text(output)],
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            is_error: true,
            content: vec![ContentBlock::text(error)],
        }
    }

    /// Flatten into a single text blob for a `tool` message.
    ///
    /// Non-empty text blocks are joined with newlines; an error with no text
    /// yields [`EMPTY_ERROR_PLACEHOLDER`].
    pub fn flatten_text(&self) -> String {
        let text = self
            .content
            .iter()
            .filter_map(|block| block.text.as_deref())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        if text.is_empty() && self.is_error {
            EMPTY_ERROR_PLACEHOLDER.to_string()
        } else {
            text
        }
    }
}

/// External source of callable tools
#[async_trait]
pub trait ToolProvider: Send + Sync {
    /// Discover the tools this provider offers
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>>;

    /// Execute a tool by name
    async fn call_tool(&self, name: &str, arguments: ToolArguments) -> Result<ToolResult>;
}

/// Parameter definition for tool schema
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParameterSchema {
    /// Parameter name
    pub name: String,

    /// JSON Schema type (string, number, integer, boolean, array)
    #[serde(rename = "type")]
    pub param_type: String,

    /// Human-readable description
    pub description: String,

    /// Whether this parameter is required
    #[serde(default)]
    pub required: bool,

    /// Default value if not provided
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,

    /// Enum of allowed values
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<serde_json::Value>>,

    /// Element schema for `array` parameters
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub items: Option<serde_json::Value>,
}

impl ParameterSchema {
    pub fn new(
        name: impl Into<String>,
        param_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            param_type: param_type.into(),
            description: description.into(),
            required: false,
            default: None,
            enum_values: None,
            items: None,
        }
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, default: serde_json::Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_enum(mut self, values: Vec<serde_json::Value>) -> Self {
        self.enum_values = Some(values);
        self
    }

    pub fn with_items(mut self, items: serde_json::Value) -> Self {
        self.items = Some(items);
        self
    }

    fn to_json_schema(&self) -> serde_json::Value {
        let mut property = serde_json::json!({
            "type": self.param_type,
            "description": self.description,
        });
        if let Some(items) = &self.items {
            property["items"] = items.clone();
        }
        if let Some(default) = &self.default {
            property["default"] = default.clone();
        }
        if let Some(values) = &self.enum_values {
            property["enum"] = serde_json::Value::Array(values.clone());
        }
        property
    }
}

/// Declarative schema for a local tool
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Unique tool identifier
    pub name: String,

    /// Human-readable description (shown to LLM)
    pub description: String,

    /// Parameter definitions
    pub parameters: Vec<ParameterSchema>,
}

impl ToolSchema {
    /// Render as a provider descriptor with a JSON Schema object
    pub fn to_descriptor(&self) -> ToolDescriptor {
        let properties: serde_json::Map<String, serde_json::Value> = self
            .parameters
            .iter()
            .map(|p| (p.name.clone(), p.to_json_schema()))
            .collect();
        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        ToolDescriptor {
            name: self.name.clone(),
            description: self.description.clone(),
            input_schema: Some(serde_json::json!({
                "type": "object",
                "properties": properties,
                "required": required,
            })),
        }
    }
}

/// Tool trait - implement to add new local capabilities
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool's schema for LLM function calling
    fn schema(&self) -> ToolSchema;

    /// Execute the tool with given arguments
    async fn execute(&self, arguments: &ToolArguments) -> Result<ToolResult>;

    /// Validate arguments before execution (optional)
    fn validate(&self, arguments: &ToolArguments) -> Result<()> {
        let schema = self.schema();

        for param in &schema.parameters {
            if param.required && !arguments.contains_key(&param.name) {
                return Err(AgentError::ToolValidation(format!(
                    "Missing required parameter: {}",
                    param.name
                )));
            }
        }

        Ok(())
    }
}

/// Registry for in-process tools
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a new tool
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        let schema = tool.schema();
        self.tools.insert(schema.name, Arc::new(tool));
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Tool names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[async_trait]
impl ToolProvider for ToolRegistry {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>> {
        let mut descriptors: Vec<ToolDescriptor> =
            self.tools.values().map(|t| t.schema().to_descriptor()).collect();
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(descriptors)
    }

    async fn call_tool(&self, name: &str, arguments: ToolArguments) -> Result<ToolResult> {
        let tool = self
            .get(name)
            .ok_or_else(|| AgentError::ToolNotFound(name.to_string()))?;

        tool.validate(&arguments)?;
        tool.execute(&arguments).await
    }
}
