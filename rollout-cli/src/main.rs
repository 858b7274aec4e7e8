//! Rollout CLI
//!
//! Command-line interface for inspecting clusters and driving pipelines on a
//! rollout server.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rollout")]
#[command(about = "Rollout deployment CLI", long_about = None)]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = "config.yml")]
    config: PathBuf,

    /// Server URL, overrides the configuration file
    #[arg(long, env = "ROLLOUT_SERVER_URL")]
    server_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(&cli.config, cli.server_url)?;

    handle_command(cli.command.unwrap_or(Commands::Help), &config).await
}
