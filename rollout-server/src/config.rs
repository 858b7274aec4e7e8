//! Server configuration
//!
//! Defines the process layer, listening address, upstream worker and the
//! locations of pipeline definitions and provider backends.

use anyhow::{Context, Result};
use rollout_core::Layer;
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Which modules this process hosts
    pub layer: Layer,

    /// Address the HTTP API listens on
    pub bind_addr: String,

    /// Worker base URL (e.g., "http://worker:8080"), required by the server layer
    pub worker_url: Option<String>,

    /// Directory of YAML pipeline definitions
    pub pipelines_dir: PathBuf,

    /// YAML cluster inventory
    pub inventory: PathBuf,

    /// Docker Registry v2 base URL; the images module is not hosted without it
    pub registry_url: Option<String>,

    /// Incoming webhook for events with the `slack` topic
    pub slack_webhook: Option<String>,

    /// Timeout for remote dispatch and provider HTTP calls
    pub request_timeout: Duration,

    /// Steps one pipeline run may take
    pub max_steps: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            layer: Layer::Standalone,
            bind_addr: "0.0.0.0:8080".to_string(),
            worker_url: None,
            pipelines_dir: PathBuf::from("pipelines"),
            inventory: PathBuf::from("inventory.yml"),
            registry_url: None,
            slack_webhook: None,
            request_timeout: Duration::from_secs(30),
            max_steps: rollout_engine::DEFAULT_MAX_STEPS,
        }
    }
}

impl ServerConfig {
    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - ROLLOUT_LAYER (optional, standalone | server | worker, default: standalone)
    /// - ROLLOUT_BIND_ADDR (optional, default: 0.0.0.0:8080)
    /// - ROLLOUT_WORKER_URL (required by the server layer)
    /// - ROLLOUT_PIPELINES_DIR (optional, default: pipelines)
    /// - ROLLOUT_INVENTORY (optional, default: inventory.yml)
    /// - ROLLOUT_REGISTRY_URL (optional)
    /// - ROLLOUT_SLACK_WEBHOOK (optional)
    /// - ROLLOUT_REQUEST_TIMEOUT (optional, seconds, default: 30)
    /// - ROLLOUT_MAX_STEPS (optional, default: 256)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Creates configuration from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let layer = match var("ROLLOUT_LAYER") {
            Some(value) => value
                .parse::<Layer>()
                .map_err(|e| anyhow::anyhow!(e))
                .context("Invalid ROLLOUT_LAYER")?,
            None => defaults.layer,
        };

        let request_timeout = match var("ROLLOUT_REQUEST_TIMEOUT") {
            Some(value) => Duration::from_secs(
                value
                    .trim()
                    .parse::<u64>()
                    .context("ROLLOUT_REQUEST_TIMEOUT must be a number of seconds")?,
            ),
            None => defaults.request_timeout,
        };

        let max_steps = match var("ROLLOUT_MAX_STEPS") {
            Some(value) => value
                .trim()
                .parse::<usize>()
                .context("ROLLOUT_MAX_STEPS must be a positive integer")?,
            None => defaults.max_steps,
        };

        Ok(Self {
            layer,
            bind_addr: var("ROLLOUT_BIND_ADDR").unwrap_or(defaults.bind_addr),
            worker_url: var("ROLLOUT_WORKER_URL"),
            pipelines_dir: var("ROLLOUT_PIPELINES_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.pipelines_dir),
            inventory: var("ROLLOUT_INVENTORY")
                .map(PathBuf::from)
                .unwrap_or(defaults.inventory),
            registry_url: var("ROLLOUT_REGISTRY_URL"),
            slack_webhook: var("ROLLOUT_SLACK_WEBHOOK"),
            request_timeout,
            max_steps,
        })
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.bind_addr.is_empty() {
            anyhow::bail!("bind_addr cannot be empty");
        }

        match &self.worker_url {
            Some(url) if !url.starts_with("http://") && !url.starts_with("https://") => {
                anyhow::bail!("worker_url must start with http:// or https://");
            }
            None if self.layer.requires_upstream() => {
                anyhow::bail!("ROLLOUT_WORKER_URL is required when running the {} layer", self.layer);
            }
            _ => {}
        }

        if self.request_timeout.is_zero() {
            anyhow::bail!("request_timeout must be greater than 0");
        }

        if self.max_steps == 0 {
            anyhow::bail!("max_steps must be greater than 0");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.layer, Layer::Standalone);
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.max_steps, 256);
        assert!(config.registry_url.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_reads_variables() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("ROLLOUT_LAYER", "Worker"),
            ("ROLLOUT_BIND_ADDR", "127.0.0.1:9000"),
            ("ROLLOUT_PIPELINES_DIR", "/etc/rollout/pipelines"),
            ("ROLLOUT_REGISTRY_URL", "https://registry.example.com"),
            ("ROLLOUT_REQUEST_TIMEOUT", "5"),
            ("ROLLOUT_MAX_STEPS", "10"),
        ]))
        .unwrap();

        assert_eq!(config.layer, Layer::Worker);
        assert_eq!(config.bind_addr, "127.0.0.1:9000");
        assert_eq!(config.pipelines_dir, PathBuf::from("/etc/rollout/pipelines"));
        assert_eq!(config.registry_url.as_deref(), Some("https://registry.example.com"));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.max_steps, 10);
    }

    #[test]
    fn test_rejects_malformed_values() {
        assert!(ServerConfig::from_lookup(lookup(&[("ROLLOUT_LAYER", "edge")])).is_err());
        assert!(ServerConfig::from_lookup(lookup(&[("ROLLOUT_MAX_STEPS", "many")])).is_err());
    }

    #[test]
    fn test_config_validation() {
        let mut config = ServerConfig {
            layer: Layer::Server,
            ..ServerConfig::default()
        };

        // The server layer needs a worker
        assert!(config.validate().is_err());

        config.worker_url = Some("worker:8080".to_string());
        assert!(config.validate().is_err());

        config.worker_url = Some("http://worker:8080".to_string());
        assert!(config.validate().is_ok());

        config.max_steps = 0;
        assert!(config.validate().is_err());
    }
}
