//! Hash digest tool

use async_trait::async_trait;
use sha2::{Digest, Sha256, Sha512};

use agent_core::{tool::ParameterSchema, Result as CoreResult, Tool, ToolArguments, ToolResult, ToolSchema};

use crate::error::{optional_str, required_str, Result, ToolError};

pub struct ComputeHashTool;

#[async_trait]
impl Tool for ComputeHashTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "ComputeHash".into(),
            description: "Compute a hex-encoded hash digest of the given text".into(),
            parameters: vec![
                ParameterSchema::new("text", "string", "Text to hash").required(),
                ParameterSchema::new("algorithm", "string", "Hash algorithm")
                    .with_default(serde_json::json!("sha256"))
                    .with_enum(vec![serde_json::json!("sha256"), serde_json::json!("sha512")]),
            ],
        }
    }

    async fn execute(&self, arguments: &ToolArguments) -> CoreResult<ToolResult> {
        Ok(super::finish("ComputeHash", digest(arguments)))
    }
}

fn digest(arguments: &ToolArguments) -> Result<String> {
    let text = required_str(arguments, "text")?;

    match optional_str(arguments, "algorithm")?.unwrap_or("sha256").to_ascii_lowercase().as_str() {
        "sha256" => Ok(hex::encode(Sha256::digest(text.as_bytes()))),
        "sha512" => Ok(hex::encode(Sha512::digest(text.as_bytes()))),
        other => Err(ToolError::invalid("algorithm", format!("unsupported algorithm {other:?}"))),
    }
}
