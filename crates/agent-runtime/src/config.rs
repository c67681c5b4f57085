//! Environment Configuration
//!
//! Everything is read from environment variables (a `.env` file is loaded
//! first when present). `from_lookup` variants take any key lookup so
//! configuration can be built without touching the process environment.

use std::str::FromStr;
use std::time::Duration;

use agent_core::reasoning::{AgentConfig, DEFAULT_SYSTEM_PROMPT};
use agent_core::{AgentError, GenerationOptions, Result};

use crate::mcp::McpConfig;
use crate::openai::OpenAiConfig;

/// Parse a variable that has no default; unset or blank is `None`
pub(crate) fn parse_opt<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .filter(|raw| !raw.trim().is_empty())
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|e| AgentError::Config(format!("{key}={raw:?} is invalid: {e}")))
        })
        .transpose()
}

/// Parse a variable, falling back to `default` when unset or blank
pub(crate) fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    Ok(parse_opt(lookup, key)?.unwrap_or(default))
}

pub(crate) fn seconds(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> Result<Duration> {
    parse_var(lookup, key, default).map(Duration::from_secs)
}

/// Full runtime configuration
#[derive(Clone, Debug, Default)]
pub struct RuntimeConfig {
    /// Completion service transport
    pub openai: OpenAiConfig,

    /// External MCP tool server; built-in tools are used when `None`
    pub mcp: Option<McpConfig>,

    /// Loop settings and generation options
    pub agent: AgentConfig,
}

impl RuntimeConfig {
    /// Load `.env` (if any) and read the process environment
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let agent = AgentConfig {
            system_prompt: lookup("AGENT_SYSTEM_PROMPT")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.into()),
            max_rounds: parse_var(&lookup, "AGENT_MAX_ROUNDS", AgentConfig::default().max_rounds)?,
            generation: GenerationOptions {
                model: lookup("LLM_MODEL")
                    .filter(|v| !v.trim().is_empty())
                    .unwrap_or_else(|| GenerationOptions::default().model),
                temperature: parse_opt(&lookup, "LLM_TEMPERATURE")?,
                max_tokens: parse_opt(&lookup, "LLM_MAX_TOKENS")?,
            },
        };

        Ok(Self {
            openai: OpenAiConfig::from_lookup(&lookup)?,
            mcp: McpConfig::from_lookup(&lookup)?,
            agent,
        })
    }
}
