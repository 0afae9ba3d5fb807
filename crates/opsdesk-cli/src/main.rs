mod cli;
mod commands;
mod config;
mod observability;
mod output;

use anyhow::{Context, Result};
use clap::Parser;

use cli::{Cli, Commands};
use config::AppConfig;
use output::print_error;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let format = cli.format.unwrap_or_default();

    let cfg = config::loader::load_config(cli.config.as_deref()).map_err(anyhow::Error::msg)?;
    observability::init_tracing_with_level(&cfg.logging.level);
    tracing::debug!(backend = %cfg.backend.url, app_id = %cfg.push.app_id, "Configuration loaded");

    match &cli.command {
        Commands::Route(args) => commands::route::route_payload(args, format)?,
        Commands::DecodeUrl(args) => commands::route::decode_url(args, format)?,
        Commands::Listen(args) => commands::listen::listen(&cfg, args).await?,
        Commands::Config(args) => match &args.command {
            cli::ConfigCommands::Show => show_config(&cfg)?,
        },
    }

    Ok(())
}

fn show_config(cfg: &AppConfig) -> Result<()> {
    let mut shown = cfg.clone();
    if shown.backend.token.is_some() {
        shown.backend.token = Some("***".into());
    }
    if shown.platform.registration_token.is_some() {
        shown.platform.registration_token = Some("***".into());
    }
    let json = serde_json::to_string_pretty(&shown).context("Failed to serialize config")?;
    println!("{json}");
    Ok(())
}
