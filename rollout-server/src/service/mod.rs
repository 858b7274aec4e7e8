//! Service Module
//!
//! Providers behind the cluster, images and events modules. Each provider is
//! trait-based so handlers can be registered against any backend.

pub mod cluster;
pub mod events;
pub mod images;

pub use cluster::{ClusterProvider, InventoryClusterProvider};
pub use events::{EventSink, StandardEventSink};
pub use images::{DockerImageProvider, ImageProvider};

use thiserror::Error;

/// Provider error type
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {0}")]
    Parse(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Registry error (status {status}): {message}")]
    Registry { status: u16, message: String },

    #[error("Webhook error (status {status}): {message}")]
    Webhook { status: u16, message: String },

    #[error("Deployment '{deployment}' not found in {group}")]
    UnknownDeployment { group: String, deployment: String },
}

pub type Result<T> = std::result::Result<T, ProviderError>;
