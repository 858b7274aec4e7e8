//! Image Service
//!
//! The images module's backend. `DockerImageProvider` talks to a Docker
//! Registry v2 HTTP API:
//! - `GET /v2/_catalog` lists repositories
//! - `GET /v2/<name>/tags/list` lists tags
//! - `GET /v2/<name>/manifests/<tag>` resolves a tag; the digest comes from
//!   the `Docker-Content-Digest` header and the last update time from the
//!   newest `created` stamp of the manifest history

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use rollout_core::domain::Image;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::{ProviderError, Result};

const DIGEST_HEADER: &str = "docker-content-digest";
const MANIFEST_V1: &str = "application/vnd.docker.distribution.manifest.v1+json";

/// Image registry backend
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Registry address shown to users
    fn endpoint(&self) -> &str;

    /// Repository names
    async fn images(&self) -> Result<Vec<String>>;

    /// Resolves a tag to a concrete reference
    async fn image(&self, name: &str, tag: &str) -> Result<Image>;

    /// Every tag of an image, most recently updated first
    async fn versions(&self, name: &str) -> Result<Vec<Image>>;
}

#[derive(Debug, Deserialize)]
struct Catalog {
    #[serde(default)]
    repositories: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TagList {
    #[serde(default)]
    tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default)]
    history: Vec<HistoryEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryEntry {
    v1_compatibility: String,
}

#[derive(Debug, Deserialize)]
struct V1Compatibility {
    created: Option<DateTime<Utc>>,
}

impl Manifest {
    /// Newest `created` stamp across the history
    fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.history
            .iter()
            .filter_map(|entry| serde_json::from_str::<V1Compatibility>(&entry.v1_compatibility).ok())
            .filter_map(|layer| layer.created)
            .max()
    }
}

/// Docker Registry v2 client
#[derive(Debug, Clone)]
pub struct DockerImageProvider {
    endpoint: String,
    client: Client,
}

impl DockerImageProvider {
    /// Create a new registry client
    ///
    /// # Arguments
    /// * `endpoint` - Registry base URL (e.g., "https://registry.example.com")
    /// * `client` - A configured reqwest Client
    pub fn new(endpoint: impl Into<String>, client: Client) -> Self {
        let endpoint = endpoint.into();
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Registry host as used in image references
    fn host(&self) -> &str {
        self.endpoint
            .split_once("://")
            .map(|(_, host)| host)
            .unwrap_or(&self.endpoint)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.endpoint, path);
        let response = self.client.get(&url).send().await?;
        let response = Self::check(response).await?;

        response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(format!("{}: {}", url, e)))
    }

    async fn manifest(&self, name: &str, tag: &str) -> Result<(Manifest, Option<String>)> {
        let url = format!("{}/v2/{}/manifests/{}", self.endpoint, name, tag);
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, MANIFEST_V1)
            .send()
            .await?;
        let response = Self::check(response).await?;

        let digest = response
            .headers()
            .get(DIGEST_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let manifest = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(format!("{}: {}", url, e)))?;

        Ok((manifest, digest))
    }

    /// Turns non-success statuses into errors
    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(ProviderError::Registry {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl ImageProvider for DockerImageProvider {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn images(&self) -> Result<Vec<String>> {
        let catalog: Catalog = self.get_json("/v2/_catalog").await?;
        Ok(catalog.repositories)
    }

    async fn image(&self, name: &str, tag: &str) -> Result<Image> {
        let (manifest, digest) = self.manifest(name, tag).await?;

        let mut image = Image::new(name).with_tag(tag);
        image.last_updated = manifest.last_updated();
        image.url = digest.map(|digest| format!("{}/{}@{}", self.host(), name, digest));

        Ok(image)
    }

    async fn versions(&self, name: &str) -> Result<Vec<Image>> {
        let tags: TagList = self.get_json(&format!("/v2/{}/tags/list", name)).await?;

        let mut versions = Vec::new();
        for tag in tags.tags.unwrap_or_default() {
            let (manifest, _) = self.manifest(name, &tag).await?;
            let mut image = Image::new(name).with_tag(tag);
            image.last_updated = manifest.last_updated();
            versions.push(image);
        }

        // stable: equal stamps keep registry order
        versions.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));
        Ok(versions)
    }
}
