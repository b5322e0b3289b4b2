mod commands;
mod gateway;
mod governance;

#[cfg(test)]
mod test_support;

use clap::{Parser, Subcommand};
use ducker_channels::console::ConsoleTransport;
use ducker_core::{
    clock::SystemClock,
    config::{self, shellexpand, Config, Prompts},
    traits::Provider,
};
use ducker_memory::Store;
use ducker_providers::gemini::GeminiProvider;
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(
    name = "ducker",
    version,
    about = "Ducker — WhatsApp group agent with AI replies and fun commands"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the agent on the configured transport.
    Start,
    /// Check configuration, backend, and history store health.
    Status,
    /// Send a one-shot prompt to the AI backend.
    Ask {
        /// The prompt to send.
        #[arg(trailing_var_arg = true)]
        message: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(&cli.config)?;
    config::ensure_layout(&cfg.ducker.data_dir)?;
    let _log_guard = init_tracing(&cfg);

    match cli.command {
        Commands::Start => {
            let provider = build_provider(&cfg);
            if provider.is_none() {
                tracing::warn!("No AI backend configured; AI replies will answer with a notice");
            }

            let console = cfg.channel.console.clone().unwrap_or_default();
            if !console.enabled {
                anyhow::bail!("No transport enabled. Enable [channel.console] in config.toml.");
            }
            let transport = Arc::new(ConsoleTransport::new(console));

            let history = Arc::new(Store::new(&cfg.memory).await?);
            let prompts = Prompts::load(&cfg.ducker.data_dir);

            eprintln!("🦆 Ducker — Starting agent...");
            let gw = gateway::Gateway::new(
                transport,
                provider,
                history,
                &cfg,
                prompts,
                Arc::new(SystemClock),
            );
            Arc::new(gw).run().await?;
        }
        Commands::Status => {
            println!("🦆 Ducker — Status Check\n");
            println!("Config: {}", cli.config);
            println!("Data dir: {}", shellexpand(&cfg.ducker.data_dir));
            println!("Default provider: {}", cfg.provider.default);
            println!();

            let gemini = cfg.provider.gemini.clone().unwrap_or_default();
            let state = match build_provider(&cfg) {
                Some(p) if p.is_available().await => "available",
                Some(_) => "configured but unreachable",
                None if !gemini.enabled => "disabled",
                None => "missing api_key (set GEMINI_API_KEY)",
            };
            println!("  gemini ({}): {state}", gemini.model);

            match Store::new(&cfg.memory).await {
                Ok(store) => match store.db_size().await {
                    Ok(bytes) => println!("  history: {} ({bytes} bytes)", cfg.memory.db_path),
                    Err(e) => println!("  history: unreadable ({e})"),
                },
                Err(e) => println!("  history: unavailable ({e})"),
            }

            let console = cfg.channel.console.clone().unwrap_or_default();
            println!(
                "  console: {} as {}",
                if console.enabled { "enabled" } else { "disabled" },
                console.bot_id
            );
        }
        Commands::Ask { message } => {
            if message.is_empty() {
                anyhow::bail!("no prompt provided. Usage: ducker ask <prompt>");
            }
            let Some(provider) = build_provider(&cfg) else {
                anyhow::bail!(
                    "the AI backend is not configured. Set provider.gemini.api_key or GEMINI_API_KEY."
                );
            };
            let reply = provider.generate(&message.join(" ")).await?;
            println!("{}", reply.trim());
        }
    }

    Ok(())
}

/// Stderr plus a daily-rolling file under `{data_dir}/logs/`.
fn init_tracing(cfg: &Config) -> WorkerGuard {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cfg.ducker.log_level));

    let log_dir = format!("{}/logs", shellexpand(&cfg.ducker.data_dir));
    let appender = tracing_appender::rolling::daily(log_dir, "ducker.log");
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .init();

    guard
}

/// Build the configured backend, or `None` when it is disabled or has no key.
fn build_provider(cfg: &Config) -> Option<Arc<dyn Provider>> {
    if cfg.provider.default != "gemini" {
        tracing::warn!("unsupported provider: {}", cfg.provider.default);
        return None;
    }
    let gemini = cfg.provider.gemini.as_ref().filter(|g| g.enabled)?;
    let api_key = gemini.resolved_api_key()?;
    Some(Arc::new(GeminiProvider::from_config(
        api_key,
        gemini.model.clone(),
    )))
}
