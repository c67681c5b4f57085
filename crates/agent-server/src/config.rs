//! Server configuration
//!
//! The listen address plus the runtime settings shared with the CLI.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use agent_core::{AgentError, Result};
use agent_runtime::RuntimeConfig;

pub const DEFAULT_BIND_ADDR: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 3000);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// `BIND_ADDR`, default `0.0.0.0:3000`
    pub bind_addr: SocketAddr,
    pub runtime: RuntimeConfig,
}

impl ServerConfig {
    /// Load `.env` (if any) and read the process environment
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bind_addr = match lookup("BIND_ADDR").filter(|v| !v.trim().is_empty()) {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|e| AgentError::Config(format!("BIND_ADDR={raw:?} is invalid: {e}")))?,
            None => DEFAULT_BIND_ADDR,
        };

        Ok(Self {
            bind_addr,
            runtime: RuntimeConfig::from_lookup(&lookup)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bind_addr() {
        let config = ServerConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.bind_addr.to_string(), "0.0.0.0:3000");
        assert!(config.runtime.mcp.is_none());
    }

    #[test]
    fn test_bind_addr_override() {
        let config = ServerConfig::from_lookup(|key| match key {
            "BIND_ADDR" => Some(" 127.0.0.1:8088 ".to_string()),
            "LLM_MODEL" => Some("qwen2.5".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8088");
        assert_eq!(config.runtime.agent.generation.model, "qwen2.5");
    }

    #[test]
    fn test_invalid_bind_addr_is_config_error() {
        let err = ServerConfig::from_lookup(|key| (key == "BIND_ADDR").then(|| "localhost".to_string())).unwrap_err();
        assert!(matches!(err, AgentError::Config(msg) if msg.contains("BIND_ADDR")));
    }
}
