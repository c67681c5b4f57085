//! Current time tool

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};

use agent_core::{tool::ParameterSchema, Result as CoreResult, Tool, ToolArguments, ToolResult, ToolSchema};

use crate::error::{optional_str, Result, ToolError};

pub struct GetTimeTool;

#[async_trait]
impl Tool for GetTimeTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "GetTime".into(),
            description: "Get the current date and time in UTC".into(),
            parameters: vec![ParameterSchema::new("format", "string", "Output format: 'iso', 'human', or 'unix'")
                .with_default(serde_json::json!("iso"))
                .with_enum(vec![
                    serde_json::json!("iso"),
                    serde_json::json!("human"),
                    serde_json::json!("unix"),
                ])],
        }
    }

    async fn execute(&self, arguments: &ToolArguments) -> CoreResult<ToolResult> {
        let outcome = optional_str(arguments, "format").and_then(|format| format_time(Utc::now(), format));
        Ok(super::finish("GetTime", outcome))
    }
}

fn format_time(now: DateTime<Utc>, format: Option<&str>) -> Result<String> {
    match format.unwrap_or("iso") {
        "iso" => Ok(now.to_rfc3339_opts(SecondsFormat::Secs, true)),
        "unix" => Ok(now.timestamp().to_string()),
        "human" => Ok(now.format("%A, %B %d, %Y at %H:%M:%S UTC").to_string()),
        other => Err(ToolError::invalid("format", format!("unknown format {other:?}"))),
    }
}
