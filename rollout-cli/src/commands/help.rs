//! Help command
//!
//! Prints the configuration in use, the clusters the server reaches and the
//! usage.

use anyhow::Result;
use clap::CommandFactory;
use colored::*;
use rollout_core::Dispatcher;
use rollout_core::procedures::cluster;

use crate::Cli;
use crate::config::Config;

/// Show configuration and usage
pub async fn help(dispatcher: &dyn Dispatcher, config: &Config) -> Result<()> {
    match &config.source {
        Some(path) => println!("Configuration: {}", path.display().to_string().cyan()),
        None => println!("{}", "no configuration file found!".yellow()),
    }
    println!("Server:        {}", config.server_url.cyan());

    match dispatcher.call(&cluster::CLUSTERS, &()).await {
        Ok(clusters) if clusters.is_empty() => println!("Clusters:      {}", "none".dimmed()),
        Ok(clusters) => println!("Clusters:      {}", clusters.join(", ")),
        Err(e) if e.is_unknown_procedure() => {
            println!("Clusters:      {}", "not hosted".dimmed())
        }
        Err(e) => println!("{}", format!("Server unreachable: {}", e).red()),
    }

    println!();
    Cli::command().print_help()?;
    Ok(())
}
