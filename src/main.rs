// src/main.rs

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use commands::{ExportOptions, ImportOptions};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = commands::load_config(cli.config.as_deref(), &cli.store)?;

    match cli.command {
        Commands::Export {
            source_url,
            profile_type,
            debug,
            profile_duration_seconds,
            profile_delay_seconds,
            keep_count,
            source_id,
            once,
        } => {
            let options = ExportOptions {
                source_url,
                profile_type,
                debug,
                profile_duration_seconds,
                profile_delay_seconds,
                keep_count,
                source_id,
                once,
            };
            commands::cmd_export(config, options).await
        }
        Commands::Import { bind, scratch_dir } => {
            commands::cmd_import(config, ImportOptions { bind, scratch_dir }).await
        }
        Commands::List { json } => commands::cmd_list(config, json).await,
        Commands::Prune {
            source_id,
            keep_count,
        } => commands::cmd_prune(config, &source_id, keep_count).await,
    }
}
