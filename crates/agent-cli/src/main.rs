//! agent-cli
//!
//! Line-oriented terminal session: each line is one user turn, the final
//! answer is printed, and a blank line or end of input ends the session.
//! Ctrl-C cancels the turn in progress without leaving the session; at the
//! prompt it ends the session.

use std::future::Future;
use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use agent_core::{Agent, AgentError, Conversation};
use agent_runtime::{build_agent, RuntimeConfig};

#[derive(Parser, Debug)]
#[command(name = "agent-cli")]
#[command(version)]
#[command(about = "Chat with a tool-calling agent from the terminal")]
struct Cli {
    /// Model name sent to the completion service (overrides LLM_MODEL).
    #[arg(long)]
    model: Option<String>,

    /// Maximum tool rounds per turn (overrides AGENT_MAX_ROUNDS).
    #[arg(long)]
    max_rounds: Option<usize>,

    /// System prompt (overrides AGENT_SYSTEM_PROMPT).
    #[arg(long)]
    system_prompt: Option<String>,
}

impl Cli {
    fn apply(self, config: &mut RuntimeConfig) {
        if let Some(model) = self.model {
            config.agent.generation.model = model;
        }
        if let Some(max_rounds) = self.max_rounds {
            config.agent.max_rounds = max_rounds;
        }
        if let Some(prompt) = self.system_prompt {
            config.agent.system_prompt = prompt;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let mut config = RuntimeConfig::from_env()?;
    cli.apply(&mut config);

    let runtime = build_agent(&config, Arc::new(agent_tools::default_registry())).await?;
    info!(model = %config.agent.generation.model, tools = runtime.agent.catalog().len(), "Session ready");

    println!(
        "Chatting with {} ({} tools). Empty line to quit.",
        config.agent.generation.model,
        runtime.agent.catalog().len()
    );

    let result = repl(&runtime.agent).await;
    runtime.shutdown().await;
    result
}

/// The text of a user turn, or `None` when the session should end
fn user_turn(line: &str) -> Option<&str> {
    let text = line.trim();
    (!text.is_empty()).then_some(text)
}

/// One Ctrl-C listener for the whole session, forwarded as messages
fn listen_for_interrupts() -> mpsc::Receiver<()> {
    let (tx, rx) = mpsc::channel(1);
    tokio::spawn(async move {
        loop {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for Ctrl-C");
                break;
            }
            if tx.send(()).await.is_err() {
                break;
            }
        }
    });
    rx
}

async fn repl(agent: &Agent) -> Result<()> {
    let mut conversation = agent.new_conversation();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut interrupts = listen_for_interrupts();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = next_line(&mut lines, &mut interrupts).await? else {
            break;
        };
        let Some(text) = user_turn(&line) else {
            break;
        };

        match turn(agent, &mut conversation, text, &mut interrupts).await {
            Ok(reply) => println!("{reply}\n"),
            Err(AgentError::Cancelled) => println!("(cancelled)\n"),
            Err(e) => {
                warn!(error = %e, "Turn failed");
                eprintln!("error: {}\n", e.user_message());
            }
        }

        // Ctrl-C pressed after a turn was already cancelled
        while interrupts.try_recv().is_ok() {}
    }

    Ok(())
}

/// Read the next input line; `None` on end of input or Ctrl-C
async fn next_line<R>(lines: &mut Lines<R>, interrupts: &mut mpsc::Receiver<()>) -> Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    tokio::select! {
        line = lines.next_line() => Ok(line?),
        Some(()) = interrupts.recv() => Ok(None),
    }
}

/// Run one turn on a copy of the history and keep it only on success
async fn turn(
    agent: &Agent,
    conversation: &mut Conversation,
    text: &str,
    interrupts: &mut mpsc::Receiver<()>,
) -> agent_core::Result<String> {
    let mut working = conversation.clone();
    let cancel = CancellationToken::new();

    let reply = until_interrupted(agent.run_to_completion(&mut working, text, &cancel), &cancel, interrupts).await?;

    *conversation = working;
    Ok(reply)
}

/// Drive `run` to its end, cancelling `cancel` on the first interrupt
async fn until_interrupted<T>(
    run: impl Future<Output = agent_core::Result<T>>,
    cancel: &CancellationToken,
    interrupts: &mut mpsc::Receiver<()>,
) -> agent_core::Result<T> {
    tokio::pin!(run);

    loop {
        tokio::select! {
            result = &mut run => return result,
            Some(()) = interrupts.recv(), if !cancel.is_cancelled() => cancel.cancel(),
        }
    }
}
