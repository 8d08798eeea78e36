use std::io::IsTerminal;

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod args;
mod commands;
mod render;
mod secret;

use args::{Cli, Command, ShellArgs};
use migreview_core::llm::client::{ApiKey, GeminiClient};
use migreview_core::{OutputMode, Session};

#[tokio::main]
async fn main() {
    // Load .env file if present (before parsing so clap sees GEMINI_API_KEY)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = run(&cli).await;

    if let Err(err) = result {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = commands::load_config(cli.config.as_deref())?;

    match &cli.command {
        Some(Command::Review(args)) => commands::review::run(args, &config).await,
        Some(Command::Shell(args)) => run_shell(args, &config).await,
        None => run_shell(&ShellArgs::default(), &config).await,
    }
}

async fn run_shell(
    args: &ShellArgs,
    config: &migreview_core::config::MigReviewConfig,
) -> anyhow::Result<()> {
    let session = Session::from_config(config)?;
    let mode = args
        .output
        .map(OutputMode::from)
        .or(config.review.output)
        .unwrap_or_default();

    let stdin = std::io::stdin();
    let interactive = stdin.is_terminal();
    let model_config = config.model.clone();

    let mut shell = commands::shell::Shell::new(
        stdin.lock(),
        std::io::stdout().lock(),
        session,
        move |key: ApiKey| GeminiClient::new(key, &model_config),
    )
    .interactive(interactive)
    .output_mode(mode);

    if let Ok(key) = ApiKey::from_env() {
        shell.set_api_key(key)?;
        tracing::debug!("Using API key from GEMINI_API_KEY");
    }

    shell.run().await
}
