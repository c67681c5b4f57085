//! Service Kit - Agent Tools
//!
//! General-purpose tools that implement `agent_core::Tool`.

mod calculate;
mod compute_hash;
mod get_host_info;
mod get_random_number;
mod get_statistics;
mod get_time;
mod list_files;

pub use calculate::CalculateTool;
pub use compute_hash::ComputeHashTool;
pub use get_host_info::GetHostInfoTool;
pub use get_random_number::GetRandomNumberTool;
pub use get_statistics::GetStatisticsTool;
pub use get_time::GetTimeTool;
pub use list_files::ListFilesTool;

use agent_core::ToolResult;
use tracing::debug;

use crate::error::Result;

/// Render a tool outcome; errors become error results the model can read
pub(crate) fn finish(tool: &str, outcome: Result<String>) -> ToolResult {
    match outcome {
        Ok(output) => ToolResult::success(output),
        Err(e) => {
            debug!(tool, error = %e, "Tool returned an error");
            ToolResult::failure(e.to_string())
        }
    }
}

#[cfg(test)]
pub(crate) fn args(value: serde_json::Value) -> agent_core::ToolArguments {
    value.as_object().cloned().unwrap_or_default()
}
