//! Configuration module
//!
//! Handles CLI configuration: the server to talk to, read from an optional
//! YAML file and overridable from the command line.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8080";

/// Contents of the configuration file
#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigFile {
    server: Option<String>,
}

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the rollout server
    pub server_url: String,

    /// File the configuration was read from, if it exists
    pub source: Option<PathBuf>,
}

impl Config {
    /// Loads the configuration
    ///
    /// # Arguments
    /// * `path` - Configuration file; a missing file is not an error
    /// * `server_url` - Overrides the file's `server` entry
    pub fn load(path: &Path, server_url: Option<String>) -> Result<Self> {
        let (file, source) = if path.exists() {
            let yaml = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let file: ConfigFile = serde_yml::from_str(&yaml)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            (file, Some(path.to_path_buf()))
        } else {
            (ConfigFile::default(), None)
        };

        let server_url = server_url
            .or(file.server)
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());

        Ok(Self {
            server_url: server_url.trim_end_matches('/').to_string(),
            source,
        })
    }
}
