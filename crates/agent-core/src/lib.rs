//! # agent-core
//!
//! Conversation model and the tool-calling orchestration loop.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          Agent                                │
//! │  ┌──────────────┐  ┌──────────────┐  ┌────────────────────┐  │
//! │  │ Orchestration│  │ ToolExecutor │  │   LlmProvider      │  │
//! │  │     Loop     │──│ ToolProvider │──│   (Strategy)       │  │
//! │  └──────────────┘  └──────────────┘  └────────────────────┘  │
//! │          │                Catalog (built once per session)    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `LlmProvider` and `ToolProvider` traits keep the loop independent of
//! any particular completion service or tool transport.

pub mod catalog;
pub mod completion;
pub mod error;
pub mod executor;
pub mod message;
pub mod provider;
pub mod reasoning;
pub mod session;
pub mod tool;

pub use catalog::{build_catalog, Catalog, CatalogEntry};
pub use completion::CompletionOutcome;
pub use error::{AgentError, Result};
pub use executor::ToolExecutor;
pub use message::{Conversation, Message, Role, ToolCallRequest};
pub use provider::{GenerationOptions, LlmProvider};
pub use reasoning::{Agent, AgentBuilder, AgentConfig};
pub use session::{MemorySessionStore, Session, SessionId};
pub use tool::{Tool, ToolArguments, ToolDescriptor, ToolProvider, ToolRegistry, ToolResult, ToolSchema};
