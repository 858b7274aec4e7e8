//! Process bootstrap
//!
//! Builds the providers, the engine and the local handler table for the
//! configured layer.

use anyhow::{Context, Result};
use rollout_client::RemoteDispatcher;
use rollout_core::procedures::{cluster, events, images};
use rollout_core::{Dispatcher, Layer, LayeredDispatcher, LocalDispatcher};
use rollout_engine::{
    CronRegistry, HttpProbe, JobsOptions, StandardJobsRepository, SystemClock,
};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::modules;
use crate::pipelines;
use crate::service::{DockerImageProvider, InventoryClusterProvider, StandardEventSink};

/// Everything a process serves
pub struct App {
    /// Procedures hosted by this process
    pub table: LocalDispatcher,
    /// Where procedures this layer does not host are forwarded
    pub upstream: Option<Arc<dyn Dispatcher>>,
    /// Present on layers that run pipelines
    pub jobs: Option<Arc<StandardJobsRepository>>,
}

impl App {
    /// Router over the full table and the upstream
    pub fn dispatcher(self, layer: Layer) -> LayeredDispatcher {
        let dispatcher = LayeredDispatcher::new(layer, self.table);
        match self.upstream {
            Some(upstream) => dispatcher.with_upstream(upstream),
            None => dispatcher,
        }
    }
}

/// Builds the application for `config.layer`
///
/// # Arguments
/// * `config` - Validated server configuration
///
/// # Returns
/// The local handler table and, when the layer runs pipelines, the jobs repository
pub fn build(config: &ServerConfig) -> Result<App> {
    let client = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()
        .context("Failed to build HTTP client")?;

    let mut table = LocalDispatcher::new();
    let layer = config.layer;

    if layer.hosts(cluster::MODULE) {
        let provider = InventoryClusterProvider::from_file(&config.inventory)
            .with_context(|| format!("Failed to load inventory {}", config.inventory.display()))?;
        modules::register_cluster(&mut table, Arc::new(provider));
        info!("Hosting cluster module from {}", config.inventory.display());
    }

    if layer.hosts(images::MODULE) {
        match &config.registry_url {
            Some(url) => {
                let provider = DockerImageProvider::new(url.clone(), client.clone());
                modules::register_images(&mut table, Arc::new(provider));
                info!("Hosting images module for {}", url);
            }
            None => warn!("ROLLOUT_REGISTRY_URL not set, images module disabled"),
        }
    }

    if layer.hosts(events::MODULE) {
        let sink = StandardEventSink::new(client.clone(), config.slack_webhook.clone());
        modules::register_events(&mut table, Arc::new(sink));
        info!("Hosting events module");
    }

    let upstream: Option<Arc<dyn Dispatcher>> = match config.worker_url.as_deref() {
        Some(url) if layer.requires_upstream() => {
            let remote = RemoteDispatcher::with_timeout(url, config.request_timeout)
                .context("Failed to build worker client")?;
            info!("Forwarding cluster, images and events calls to {}", url);
            Some(Arc::new(remote))
        }
        _ => None,
    };

    let jobs = if layer.runs_pipelines() {
        let mut engine = LayeredDispatcher::new(layer, table.clone());
        if let Some(upstream) = &upstream {
            engine = engine.with_upstream(Arc::clone(upstream));
        }

        let pipelines = pipelines::load_dir(&config.pipelines_dir)?;
        let options = JobsOptions {
            probe: Arc::new(HttpProbe::new(client)),
            max_steps: config.max_steps,
            ..JobsOptions::default()
        };
        let engine: Arc<dyn Dispatcher> = Arc::new(engine);
        let repo = StandardJobsRepository::new(
            pipelines,
            CronRegistry::new(Arc::new(SystemClock)),
            engine,
            options,
        )
        .context("Failed to register pipelines")?;

        modules::register_jobs(&mut table, repo.clone());
        info!("Hosting jobs module");
        Some(repo)
    } else {
        None
    };

    Ok(App {
        table,
        upstream,
        jobs,
    })
}
