//! OpenAI-compatible Completion Provider
//!
//! Implementation of `LlmProvider` for any service exposing
//! `POST /chat/completions` with function calling (OpenAI, Ollama's `/v1`,
//! vLLM, LM Studio, ...).

use std::time::Duration;

use agent_core::{
    catalog::CatalogEntry,
    completion::{parse_response, ChatCompletionRequest, CompletionOutcome},
    error::{AgentError, Result},
    message::Message,
    provider::{GenerationOptions, LlmProvider},
};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::{parse_opt, parse_var, seconds};
use crate::retry::{with_retry, RetryPolicy};

/// Longest slice of an error body kept in an error message
const ERROR_BODY_LIMIT: usize = 512;

/// OpenAI-compatible provider configuration
#[derive(Clone, Debug)]
pub struct OpenAiConfig {
    /// Endpoint root, e.g. `https://api.openai.com/v1`
    pub base_url: String,

    /// Bearer token, omitted when `None`
    pub api_key: Option<String>,

    /// Per-request timeout
    pub timeout: Duration,

    /// Retry behaviour for transport failures
    pub retry: RetryPolicy,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434/v1".into(),
            api_key: None,
            timeout: Duration::from_secs(120),
            retry: RetryPolicy::default(),
        }
    }
}

impl OpenAiConfig {
    pub fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            base_url: parse_var(lookup, "LLM_BASE_URL", defaults.base_url)?,
            api_key: parse_opt(lookup, "LLM_API_KEY")?,
            timeout: seconds(lookup, "LLM_TIMEOUT_SECS", defaults.timeout.as_secs())?,
            retry: RetryPolicy {
                max_retries: parse_var(lookup, "LLM_MAX_RETRIES", defaults.retry.max_retries)?,
                backoff: Duration::from_millis(parse_var(
                    lookup,
                    "LLM_RETRY_BACKOFF_MS",
                    u64::try_from(defaults.retry.backoff.as_millis()).unwrap_or(500),
                )?),
            },
        })
    }
}

/// OpenAI-compatible completion provider
pub struct OpenAiProvider {
    client: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiProvider {
    /// Create from configuration
    pub fn from_config(config: OpenAiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AgentError::Config(format!("HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    /// One request, no retries
    async fn send(&self, request: &ChatCompletionRequest<'_>) -> Result<CompletionOutcome> {
        let response = self
            .authorize(self.client.post(self.endpoint("chat/completions")))
            .json(request)
            .send()
            .await
            .map_err(|e| AgentError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AgentError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(AgentError::HttpStatus {
                status: status.as_u16(),
                body: truncate(&body, ERROR_BODY_LIMIT),
            });
        }

        parse_response(&body)
    }
}

fn truncate(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai-compatible"
    }

    async fn health_check(&self) -> Result<bool> {
        match self.authorize(self.client.get(self.endpoint("models"))).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(e) => {
                warn!("Completion service health check failed: {}", e);
                Ok(false)
            }
        }
    }

    async fn complete(
        &self,
        messages: &[Message],
        tools: &[CatalogEntry],
        options: &GenerationOptions,
    ) -> Result<CompletionOutcome> {
        let request = ChatCompletionRequest::new(options, messages, tools);
        debug!(model = %options.model, messages = messages.len(), tools = tools.len(), "Sending chat completion");

        with_retry(&self.config.retry, "chat completion", || self.send(&request)).await
    }
}
