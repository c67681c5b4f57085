//! # agent-runtime
//!
//! Adapters that plug real services into the agent loop.
//!
//! ## Providers
//!
//! - **OpenAI-compatible** completions over HTTP (Ollama, vLLM, OpenAI, ...)
//! - **MCP** tool servers spoken to over stdio
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_runtime::{build_agent, RuntimeConfig};
//!
//! let config = RuntimeConfig::from_env()?;
//! let runtime = build_agent(&config, Arc::new(agent_tools::default_registry())).await?;
//! let mut conversation = runtime.agent.new_conversation();
//! let reply = runtime
//!     .agent
//!     .run_to_completion(&mut conversation, "What time is it?", &CancellationToken::new())
//!     .await?;
//! ```

pub mod bootstrap;
pub mod config;
pub mod mcp;
pub mod openai;
pub mod retry;

pub use bootstrap::{build_agent, Runtime};
pub use config::RuntimeConfig;
pub use mcp::{McpConfig, McpToolProvider};
pub use openai::{OpenAiConfig, OpenAiProvider};
pub use retry::RetryPolicy;

// Re-export core types for convenience
pub use agent_core::{Agent, AgentError, LlmProvider, Message, Result, Role, ToolProvider};
