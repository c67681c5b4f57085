//! LLM Provider Strategy Pattern
//!
//! Defines the completion-client seam. The orchestration loop only talks to
//! [`LlmProvider`]; transports (OpenAI-compatible HTTP, test doubles) plug in
//! behind it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_core::provider::{GenerationOptions, LlmProvider};
//!
//! let provider = OpenAiProvider::from_config(config)?;
//! let outcome = provider.complete(conversation.messages(), &catalog, &options).await?;
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::catalog::CatalogEntry;
use crate::completion::CompletionOutcome;
use crate::error::Result;
use crate::message::Message;

/// Configuration for LLM generation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Model identifier (e.g., "llama3.2", "gpt-4o-mini")
    #[serde(default = "default_model")]
    pub model: String,

    /// Temperature for sampling, service default when unset
    #[serde(default)]
    pub temperature: Option<f32>,

    /// Maximum tokens to generate, service default when unset
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

fn default_model() -> String {
    "llama3.2".into()
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: None,
            max_tokens: None,
        }
    }
}

/// Strategy trait for completion services
///
/// The service is stateless between calls: the full conversation and the
/// full catalog are sent every time.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name for logs
    fn name(&self) -> &str;

    /// Check if the provider is reachable
    async fn health_check(&self) -> Result<bool>;

    /// Ask for the next move given the conversation so far.
    ///
    /// Fails with `Transport` when the request cannot be completed and with
    /// `MalformedResponse` when the reply has the wrong shape.
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[CatalogEntry],
        options: &GenerationOptions,
    ) -> Result<CompletionOutcome>;
}
