//! # agent-tools
//!
//! General-purpose tools for the agent, usable in-process through a
//! [`ToolRegistry`] or out-of-process through the `mcp-tool-server` binary.
//!
//! | Tool              | Purpose                                   |
//! |-------------------|-------------------------------------------|
//! | `GetTime`         | Current UTC time (iso, human, unix)       |
//! | `GetHostInfo`     | Hostname, OS, architecture, CPU count     |
//! | `GetRandomNumber` | Random integer in an inclusive range      |
//! | `ComputeHash`     | SHA-256 / SHA-512 hex digests             |
//! | `GetStatistics`   | Descriptive statistics of a number list   |
//! | `ListFiles`       | Sorted directory listing                  |
//! | `Calculate`       | Arithmetic expression evaluation          |

pub mod error;
pub mod mcp_server;
pub mod svckit;

use agent_core::ToolRegistry;

pub use error::{Result, ToolError};
pub use mcp_server::McpServer;

/// Re-export tools for easy registration
pub mod tools {
    pub use crate::svckit::{
        CalculateTool, ComputeHashTool, GetHostInfoTool, GetRandomNumberTool, GetStatisticsTool,
        GetTimeTool, ListFilesTool,
    };
}

/// Registry holding every built-in tool
pub fn default_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(tools::GetTimeTool);
    registry.register(tools::GetHostInfoTool);
    registry.register(tools::GetRandomNumberTool);
    registry.register(tools::ComputeHashTool);
    registry.register(tools::GetStatisticsTool);
    registry.register(tools::ListFilesTool);
    registry.register(tools::CalculateTool);
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::ToolProvider;

    #[tokio::test]
    async fn test_default_registry() {
        let registry = default_registry();
        assert_eq!(
            registry.names(),
            vec![
                "Calculate",
                "ComputeHash",
                "GetHostInfo",
                "GetRandomNumber",
                "GetStatistics",
                "GetTime",
                "ListFiles",
            ]
        );

        let descriptors = registry.list_tools().await.unwrap();
        assert!(descriptors.iter().all(|d| d.input_schema.is_some()));
    }

    #[tokio::test]
    async fn test_missing_required_argument_is_validation_error() {
        let err = default_registry()
            .call_tool("ComputeHash", agent_core::ToolArguments::new())
            .await
            .unwrap_err();
        assert!(matches!(err, agent_core::AgentError::ToolValidation(_)));
    }
}
