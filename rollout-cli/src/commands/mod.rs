//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod cluster;
mod help;
mod jobs;

use anyhow::Result;
use clap::Subcommand;
use rollout_client::RemoteDispatcher;
use rollout_core::Dispatcher;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// List pods with their restart counts
    Pods {
        /// Only this cluster
        #[arg(long)]
        cluster: Option<String>,
    },
    /// List deployments with their images
    Deployments {
        /// Only this cluster
        #[arg(long)]
        cluster: Option<String>,
    },
    /// List scalers with their replica bounds
    Scalers {
        /// Only this cluster
        #[arg(long)]
        cluster: Option<String>,
    },
    /// List registered pipelines
    Pipelines,
    /// Show what a pipeline would change
    Plan {
        /// Pipeline name
        pipeline: String,
    },
    /// Run a pipeline now
    Run {
        /// Pipeline name
        pipeline: String,
    },
    /// Show cron schedules
    Schedules {
        /// Only this pipeline
        pipeline: Option<String>,
    },
    /// Show configuration and usage
    Help,
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The CLI configuration
///
/// # Returns
/// Result indicating success or failure
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    let remote = RemoteDispatcher::new(config.server_url.clone());
    let dispatcher: &dyn Dispatcher = &remote;

    match command {
        Commands::Pods { cluster } => cluster::pods(dispatcher, cluster).await,
        Commands::Deployments { cluster } => {
            cluster::deployments(dispatcher, cluster).await
        }
        Commands::Scalers { cluster } => cluster::scalers(dispatcher, cluster).await,
        Commands::Pipelines => jobs::pipelines(dispatcher).await,
        Commands::Plan { pipeline } => jobs::plan(dispatcher, &pipeline).await,
        Commands::Run { pipeline } => jobs::run(dispatcher, &pipeline).await,
        Commands::Schedules { pipeline } => jobs::schedules(dispatcher, pipeline).await,
        Commands::Help => help::help(dispatcher, config).await,
    }
}
