//! Error Types for Built-in Tools
//!
//! Tool errors never escape as `AgentError`: they are rendered into an error
//! `ToolResult` so the model can read them and recover.

use agent_core::{tool::ToolArguments, AgentError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ToolError>;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Missing required argument: {0}")]
    MissingArgument(&'static str),

    #[error("Invalid argument '{name}': {reason}")]
    InvalidArgument { name: &'static str, reason: String },

    #[error("Evaluation error: {0}")]
    Evaluation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ToolError {
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name,
            reason: reason.into(),
        }
    }
}

impl From<ToolError> for AgentError {
    fn from(err: ToolError) -> Self {
        match err {
            ToolError::MissingArgument(_) | ToolError::InvalidArgument { .. } => {
                Self::ToolValidation(err.to_string())
            }
            other => Self::ToolExecution(other.to_string()),
        }
    }
}

/// Optional string argument; `null` counts as absent
pub fn optional_str<'a>(args: &'a ToolArguments, name: &'static str) -> Result<Option<&'a str>> {
    match args.get(name) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(ToolError::invalid(name, format!("expected a string, got {other}"))),
    }
}

pub fn required_str<'a>(args: &'a ToolArguments, name: &'static str) -> Result<&'a str> {
    optional_str(args, name)?.ok_or(ToolError::MissingArgument(name))
}

/// Optional integer argument; numeric strings are accepted
pub fn optional_i64(args: &ToolArguments, name: &'static str) -> Result<Option<i64>> {
    match args.get(name) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| ToolError::invalid(name, format!("expected an integer, got {n}"))),
        Some(serde_json::Value::String(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ToolError::invalid(name, format!("expected an integer, got {s:?}"))),
        Some(other) => Err(ToolError::invalid(name, format!("expected an integer, got {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(value: serde_json::Value) -> ToolArguments {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_optional_str() {
        let a = args(serde_json::json!({"text": "hi", "none": null, "num": 3}));
        assert_eq!(optional_str(&a, "text").unwrap(), Some("hi"));
        assert_eq!(optional_str(&a, "none").unwrap(), None);
        assert_eq!(optional_str(&a, "missing").unwrap(), None);
        assert!(optional_str(&a, "num").is_err());
        assert!(matches!(required_str(&a, "missing"), Err(ToolError::MissingArgument("missing"))));
    }

    #[test]
    fn test_into_agent_error() {
        let err: AgentError = ToolError::MissingArgument("text").into();
        assert!(matches!(err, AgentError::ToolValidation(msg) if msg.contains("text")));

        let err: AgentError = ToolError::Evaluation("division by zero".into()).into();
        assert!(matches!(err, AgentError::ToolExecution(_)));
    }

    #[test]
    fn test_optional_i64_accepts_quoted_numbers() {
        let a = args(serde_json::json!({"n": 5, "s": " 7 ", "f": 1.5, "bad": "x"}));
        assert_eq!(optional_i64(&a, "n").unwrap(), Some(5));
        assert_eq!(optional_i64(&a, "s").unwrap(), Some(7));
        assert!(optional_i64(&a, "f").is_err());
        assert!(optional_i64(&a, "bad").is_err());
        assert_eq!(optional_i64(&a, "missing").unwrap(), None);
    }
}
