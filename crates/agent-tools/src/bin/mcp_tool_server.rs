//! mcp-tool-server
//!
//! Exposes the built-in tools as an MCP server on stdin/stdout. Logs go to
//! stderr so they never corrupt the protocol stream.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_tools::{default_registry, McpServer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let registry = default_registry();
    tracing::info!("Serving {} tools over stdio", registry.len());

    McpServer::new(Arc::new(registry))
        .serve(tokio::io::stdin(), tokio::io::stdout())
        .await?;

    Ok(())
}
