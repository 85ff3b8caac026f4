//! StudyKit CLI — entry point.
//!
//! # Commands
//!
//! - `studykit ask [PROMPT] [-p PROVIDER]` — one prompt through the provider chain
//! - `studykit serve` — HTTP pass-through for the web front end
//! - `studykit status` — show configuration and provider credentials
//! - `studykit onboard` — write a default config

mod helpers;
mod onboard;
mod server;
mod status;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use studykit_core::config::load_config;
use studykit_providers::{DispatchOptions, Dispatcher};

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// 📚 StudyKit — AI study tools backed by whichever LLM provider is up
#[derive(Parser)]
#[command(name = "studykit", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one prompt and print the completion
    Ask {
        /// Prompt text. Omit or pass "-" to read from stdin.
        prompt: Option<String>,

        /// Provider to try first (e.g. "groq")
        #[arg(short, long)]
        provider: Option<String>,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Serve the /api/ai-chat pass-through
    Serve {
        /// Bind address (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port (overrides config)
        #[arg(long)]
        port: Option<u16>,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Show configuration and provider status
    Status,

    /// Write a default configuration file
    Onboard,
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ask {
            prompt,
            provider,
            logs,
        } => {
            init_logging(logs);
            run_ask(prompt, provider).await
        }
        Commands::Serve { host, port, logs } => {
            init_logging(logs);
            run_serve(host, port).await
        }
        Commands::Status => status::run(),
        Commands::Onboard => onboard::run(),
    }
}

async fn run_ask(prompt: Option<String>, provider: Option<String>) -> Result<()> {
    let config = load_config(None);
    let dispatcher = Dispatcher::from_config(&config)?;
    let prompt = helpers::read_prompt(prompt)?;

    let options = DispatchOptions {
        preferred_provider: provider,
        ..Default::default()
    };
    let completion = dispatcher
        .dispatch(&prompt, &options)
        .await
        .context("no provider could answer")?;

    helpers::print_completion(&completion);
    Ok(())
}

async fn run_serve(host: Option<String>, port: Option<u16>) -> Result<()> {
    let config = load_config(None);
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    let dispatcher = Arc::new(Dispatcher::from_config(&config)?);
    info!(providers = ?dispatcher.provider_names(), "Provider chain loaded");

    helpers::print_banner(&format!("{host}:{port}"));
    server::run(dispatcher, &host, port).await
}

/// Initialize tracing/logging.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("studykit=debug,studykit_providers=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
