//! Orchestration Loop
//!
//! Drives one user turn to a final answer:
//!
//! ```text
//! user message ─▶ Awaiting Completion ──Final──▶ Done
//!                      ▲        │
//!                      │   ToolCallsRequested
//!                      │        ▼
//!                      └── Executing Tools (sequential, in request order)
//! ```
//!
//! Suspension points are the completion request and each tool call; both
//! honour a [`CancellationToken`].

use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::catalog::{build_catalog, Catalog};
use crate::completion::CompletionOutcome;
use crate::error::{AgentError, Result};
use crate::executor::ToolExecutor;
use crate::message::{Conversation, Message};
use crate::provider::{GenerationOptions, LlmProvider};
use crate::tool::ToolProvider;

/// Agent configuration
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// System prompt that seeds every conversation
    pub system_prompt: String,

    /// Maximum tool rounds per user turn
    pub max_rounds: usize,

    /// Generation options
    pub generation: GenerationOptions,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            max_rounds: 10,
            generation: GenerationOptions::default(),
        }
    }
}

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant with access to tools. \
Call a tool whenever it gives you information you do not have, such as the current time, \
host details, random numbers, hashes, statistics or directory listings. \
After receiving tool results, answer the user concisely. \
If a tool reports an error, explain what went wrong instead of guessing.";

/// Reject blank user input before a run starts
pub fn validate_user_input(text: &str) -> Result<&str> {
    if text.trim().is_empty() {
        return Err(AgentError::InvalidInput("message must not be empty".into()));
    }
    Ok(text)
}

/// The main Agent struct
///
/// Shared read-only across concurrent conversations; each run borrows its
/// own [`Conversation`] exclusively.
pub struct Agent {
    provider: Arc<dyn LlmProvider>,
    executor: ToolExecutor,
    catalog: Catalog,
    config: AgentConfig,
}

impl Agent {
    fn new(
        provider: Arc<dyn LlmProvider>,
        tools: Arc<dyn ToolProvider>,
        catalog: Catalog,
        config: AgentConfig,
    ) -> Self {
        Self {
            provider,
            executor: ToolExecutor::new(tools),
            catalog,
            config,
        }
    }

    /// Discover the tool catalog once and create the agent
    pub async fn connect(
        provider: Arc<dyn LlmProvider>,
        tools: Arc<dyn ToolProvider>,
        config: AgentConfig,
    ) -> Result<Self> {
        let descriptors = tools.list_tools().await?;
        let catalog = build_catalog(&descriptors);
        info!(provider = provider.name(), tools = catalog.len(), "Tool catalog ready");
        Ok(Self::new(provider, tools, catalog, config))
    }

    /// Start a conversation seeded with the system prompt
    pub fn new_conversation(&self) -> Conversation {
        Conversation::with_system_prompt(self.config.system_prompt.clone())
    }

    /// Process one user turn and return the final answer.
    ///
    /// Tool calls of a round run one after another in the order the
    /// completion service listed them. Completion failures end the run;
    /// tool failures are reported back to the service as tool messages.
    pub async fn run_to_completion(
        &self,
        conversation: &mut Conversation,
        user_text: &str,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let user_text = validate_user_input(user_text)?;
        conversation.append(Message::user(user_text))?;

        let mut rounds = 0;

        loop {
            debug!(round = rounds, messages = conversation.len(), "Requesting completion");

            let outcome = cancellable(
                cancel,
                self.provider
                    .complete(conversation.messages(), &self.catalog, &self.config.generation),
            )
            .await?;

            let calls = match outcome {
                CompletionOutcome::Final(text) => {
                    conversation.append(Message::assistant(text.clone()))?;
                    info!(rounds, "Final answer produced");
                    return Ok(text);
                }
                CompletionOutcome::ToolCallsRequested { content, calls } => {
                    if rounds >= self.config.max_rounds {
                        warn!(max = self.config.max_rounds, "Tool round limit reached");
                        return Err(AgentError::LoopExceeded(self.config.max_rounds));
                    }
                    rounds += 1;
                    conversation.append(Message::assistant_tool_calls(content, calls.clone()))?;
                    calls
                }
            };

            info!(round = rounds, calls = calls.len(), "Executing tool round");

            for call in &calls {
                let message = cancellable(cancel, async { Ok(self.executor.execute(call).await) }).await?;
                conversation.append(message)?;
            }
        }
    }

    /// Session tool catalog
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Completion provider
    pub fn provider(&self) -> &Arc<dyn LlmProvider> {
        &self.provider
    }

    /// Get configuration
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }
}

async fn cancellable<T>(
    cancel: &CancellationToken,
    operation: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(AgentError::Cancelled),
        result = operation => result,
    }
}

/// Builder for Agent configuration
pub struct AgentBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    tools: Option<Arc<dyn ToolProvider>>,
    config: AgentConfig,
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            tools: None,
            config: AgentConfig::default(),
        }
    }

    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn tools(mut self, tools: Arc<dyn ToolProvider>) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    /// Discover the catalog and build the agent
    pub async fn build(self) -> Result<Agent> {
        let provider = self
            .provider
            .ok_or_else(|| AgentError::Config("Provider is required".into()))?;
        let tools = self
            .tools
            .ok_or_else(|| AgentError::Config("Tool provider is required".into()))?;

        Agent::connect(provider, tools, self.config).await
    }
}
