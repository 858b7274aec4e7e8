//! Rollout Server
//!
//! Hosts the rollout modules over HTTP.
//!
//! Architecture:
//! - Configuration: layer, providers and pipelines from environment
//! - Services: cluster inventory, Docker registry and event sink providers
//! - Modules: providers and the jobs repository bound to procedures
//! - API: the local handler table exposed for remote dispatch
//!
//! A standalone process hosts everything. A server process runs pipelines
//! and forwards cluster, images and events calls to a worker process.

pub mod api;
pub mod bootstrap;
pub mod config;
pub mod modules;
pub mod pipelines;
pub mod service;

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::AppState;
use crate::config::ServerConfig;
use rollout_engine::JobsRepository;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "rollout_server=info,rollout_engine=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Rollout Server");

    // Load configuration
    let config = ServerConfig::from_env()?;
    config.validate()?;
    info!(
        "Loaded configuration: layer={}, bind_addr={}",
        config.layer, config.bind_addr
    );

    let app = bootstrap::build(&config)?;
    info!("Serving {} procedure(s)", app.table.procedures().len());

    if let Some(jobs) = &app.jobs {
        jobs.start();
        for cron in jobs.crons() {
            if let Some(next) = cron.next_runs.first() {
                info!("Scheduled '{}', next run at {}", cron.name, next);
            }
        }
    }

    let jobs = app.jobs.clone();

    // Build router with all API endpoints
    let router = api::create_router(AppState {
        dispatcher: Arc::new(app.dispatcher(config.layer)),
    });

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    info!("Listening on {}", config.bind_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Some(jobs) = &jobs {
        jobs.stop();
    }

    info!("Rollout Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
