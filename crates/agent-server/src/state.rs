//! Application State

use std::sync::Arc;

use agent_core::{Agent, MemorySessionStore};
use tokio_util::sync::CancellationToken;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Agent with its session tool catalog
    pub agent: Arc<Agent>,

    /// Conversations carried across requests
    pub sessions: Arc<MemorySessionStore>,

    /// Cancelled on server shutdown; each run gets a child token
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(agent: Arc<Agent>, shutdown: CancellationToken) -> Self {
        Self {
            agent,
            sessions: Arc::new(MemorySessionStore::new()),
            shutdown,
        }
    }
}
