//! agent-server
//!
//! Axum-based HTTP boundary around the tool-calling agent. Conversations
//! live in memory and are addressed by `conversation_id`.

mod config;
mod handlers;
mod state;

use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_runtime::build_agent;

use crate::config::ServerConfig;
use crate::handlers::{chat_handler, delete_chat, health_check, list_tools};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let server_config = ServerConfig::from_env()?;
    let config = &server_config.runtime;

    let runtime = build_agent(config, Arc::new(agent_tools::default_registry())).await?;
    let agent = runtime.agent.clone();

    match agent.provider().health_check().await {
        Ok(true) => tracing::info!(base_url = %config.openai.base_url, "✓ Completion service reachable"),
        Ok(false) | Err(_) => {
            tracing::warn!(base_url = %config.openai.base_url, "⚠ Completion service not reachable - chats will fail");
        }
    }

    tracing::info!("Tool catalog has {} tools:", agent.catalog().len());
    for entry in agent.catalog().iter() {
        tracing::info!("  • {}", entry.function.name);
    }

    let shutdown = CancellationToken::new();
    let app = build_router(AppState::new(agent, shutdown.clone()));

    // Start server
    let addr = server_config.bind_addr;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("🚀 agent-server running on http://{}", addr);
    tracing::info!("Endpoints:");
    tracing::info!("  GET    /health         - Health check");
    tracing::info!("  GET    /api/tools      - Tool catalog");
    tracing::info!("  POST   /api/chat       - Send message");
    tracing::info!("  DELETE /api/chat/{{id}}  - Forget conversation");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    runtime.shutdown().await;
    tracing::info!("Server stopped");

    Ok(())
}

pub(crate) fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/tools", get(list_tools))
        .route("/api/chat", post(chat_handler))
        .route("/api/chat/{id}", delete(delete_chat))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Wait for Ctrl-C, then cancel every in-flight run
async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested, cancelling in-flight runs");
    shutdown.cancel();
}
