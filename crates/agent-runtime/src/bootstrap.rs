//! Wiring configuration into a ready agent

use std::sync::Arc;

use agent_core::{Agent, AgentBuilder, Result, ToolProvider};
use tracing::info;

use crate::config::RuntimeConfig;
use crate::mcp::McpToolProvider;
use crate::openai::OpenAiProvider;

/// A connected agent plus the MCP server it owns, if any
pub struct Runtime {
    pub agent: Arc<Agent>,
    mcp: Option<Arc<McpToolProvider>>,
}

impl Runtime {
    /// Stop the MCP server process, if one was spawned
    pub async fn shutdown(&self) {
        if let Some(mcp) = &self.mcp {
            mcp.shutdown().await;
        }
    }
}

/// Build the agent described by `config`.
///
/// Tools come from the configured MCP server, or from `fallback` when no
/// server is configured. Any failure here (spawn, handshake, tool listing)
/// is fatal to start-up.
pub async fn build_agent(config: &RuntimeConfig, fallback: Arc<dyn ToolProvider>) -> Result<Runtime> {
    let provider = Arc::new(OpenAiProvider::from_config(config.openai.clone())?);

    let (tools, mcp): (Arc<dyn ToolProvider>, _) = match &config.mcp {
        Some(mcp_config) => {
            let mcp = Arc::new(McpToolProvider::spawn(mcp_config).await?);
            (mcp.clone(), Some(mcp))
        }
        None => {
            info!("No MCP server configured, using built-in tools");
            (fallback, None)
        }
    };

    let agent = AgentBuilder::new()
        .provider(provider)
        .tools(tools)
        .config(config.agent.clone())
        .build()
        .await?;
    Ok(Runtime {
        agent: Arc::new(agent),
        mcp,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::{Tool, ToolArguments, ToolRegistry, ToolResult, ToolSchema};
    use async_trait::async_trait;

    struct Echo;

    #[async_trait]
    impl Tool for Echo {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: "Echo".into(),
                description: "Echo the input".into(),
                parameters: vec![],
            }
        }

        async fn execute(&self, _args: &ToolArguments) -> Result<ToolResult> {
            Ok(ToolResult::success("echo"))
        }
    }

    #[tokio::test]
    async fn test_fallback_tools_without_mcp() {
        let config = RuntimeConfig::from_lookup(|_| None).unwrap();
        let mut registry = ToolRegistry::new();
        registry.register(Echo);

        let runtime = build_agent(&config, Arc::new(registry)).await.unwrap();
        assert_eq!(runtime.agent.catalog().len(), 1);
        assert_eq!(runtime.agent.catalog()[0].function.name, "Echo");
        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_loop_settings_reach_the_agent() {
        let config = RuntimeConfig::from_lookup(|key| match key {
            "AGENT_MAX_ROUNDS" => Some("2".to_string()),
            "AGENT_SYSTEM_PROMPT" => Some("Answer in French.".to_string()),
            _ => None,
        })
        .unwrap();

        let runtime = build_agent(&config, Arc::new(ToolRegistry::new())).await.unwrap();
        assert_eq!(runtime.agent.config().max_rounds, 2);
        assert_eq!(
            runtime.agent.new_conversation().messages()[0].content.as_deref(),
            Some("Answer in French.")
        );
    }

    #[tokio::test]
    async fn test_unspawnable_mcp_server_is_fatal() {
        let config = RuntimeConfig::from_lookup(|key| {
            (key == "MCP_SERVER_COMMAND").then(|| "/nonexistent/mcp-server-binary".to_string())
        })
        .unwrap();

        let result = build_agent(&config, Arc::new(ToolRegistry::new())).await;
        assert!(matches!(result, Err(agent_core::AgentError::Transport(_))));
    }
}
