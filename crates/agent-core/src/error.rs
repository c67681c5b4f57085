//! Error Types

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Agent error types
#[derive(Error, Debug)]
pub enum AgentError {
    /// Completion service or tool provider could not be reached
    #[error("Transport failure: {0}")]
    Transport(String),

    /// Completion service or tool provider answered with a non-success status
    #[error("Transport failure: HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// Reply could not be parsed into the expected shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Tool not offered by the provider
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Tool arguments rejected before execution
    #[error("Tool validation error: {0}")]
    ToolValidation(String),

    /// Tool ran but failed
    #[error("Tool execution error: {0}")]
    ToolExecution(String),

    /// Empty or otherwise unusable user input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A message was built with an illegal shape
    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    /// The completion service kept requesting tools past the round limit
    #[error("Maximum tool rounds ({0}) exceeded")]
    LoopExceeded(usize),

    /// The run was cancelled while waiting on a network call
    #[error("Operation cancelled")]
    Cancelled,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other/unknown error
    #[error("{0}")]
    Other(String),
}

impl AgentError {
    /// Check if error is retryable at the transport layer
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Io(_) => true,
            Self::HttpStatus { status, .. } => matches!(*status, 408 | 429 | 500..=599),
            _ => false,
        }
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport(_) | Self::HttpStatus { .. } => "The AI service is currently unavailable. Please try again.".into(),
            Self::InvalidInput(msg) => format!("Invalid input: {msg}"),
            Self::LoopExceeded(_) => "The request took too long to process. Please try a simpler query.".into(),
            Self::Cancelled => "The request was cancelled.".into(),
            _ => "An unexpected error occurred.".into(),
        }
    }
}

impl From<anyhow::Error> for AgentError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
