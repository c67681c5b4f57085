//! Random number tool

use async_trait::async_trait;
use rand::Rng;

use agent_core::{tool::ParameterSchema, Result as CoreResult, Tool, ToolArguments, ToolResult, ToolSchema};

use crate::error::{optional_i64, Result, ToolError};

const DEFAULT_MIN: i64 = 1;
const DEFAULT_MAX: i64 = 100;

pub struct GetRandomNumberTool;

#[async_trait]
impl Tool for GetRandomNumberTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "GetRandomNumber".into(),
            description: "Generate a random integer between min and max (inclusive)".into(),
            parameters: vec![
                ParameterSchema::new("min", "integer", "Lower bound (inclusive)").with_default(DEFAULT_MIN.into()),
                ParameterSchema::new("max", "integer", "Upper bound (inclusive)").with_default(DEFAULT_MAX.into()),
            ],
        }
    }

    async fn execute(&self, arguments: &ToolArguments) -> CoreResult<ToolResult> {
        Ok(super::finish("GetRandomNumber", random_in_range(arguments)))
    }
}

fn random_in_range(arguments: &ToolArguments) -> Result<String> {
    let min = optional_i64(arguments, "min")?.unwrap_or(DEFAULT_MIN);
    let max = optional_i64(arguments, "max")?.unwrap_or(DEFAULT_MAX);

    if min > max {
        return Err(ToolError::invalid("min", format!("{min} is greater than max {max}")));
    }

    Ok(rand::thread_rng().gen_range(min..=max).to_string())
}
