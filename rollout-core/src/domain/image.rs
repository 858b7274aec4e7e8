//! Image domain types

use serde::{Deserialize, Serialize};
use std::fmt;

/// A container image reference
///
/// `url` carries the resolved, digest-pinned reference and is only populated
/// once the image has been resolved against a registry or read from a
/// running workload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<chrono::DateTime<chrono::Utc>>,
}

impl Image {
    /// Creates an unresolved image reference
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tag: None,
            url: None,
            last_updated: None,
        }
    }

    /// Sets the tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Sets the resolved url
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Returns true when both images point at the same artifact
    ///
    /// Resolved urls win when both sides have one; otherwise name and tag
    /// are compared.
    pub fn same_reference(&self, other: &Image) -> bool {
        match (&self.url, &other.url) {
            (Some(a), Some(b)) => a == b,
            _ => self.name == other.name && self.tag == other.tag,
        }
    }
}

impl fmt::Display for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.url, &self.tag) {
            (Some(url), _) => write!(f, "{}", url),
            (None, Some(tag)) => write!(f, "{}:{}", self.name, tag),
            (None, None) => write!(f, "{}", self.name),
        }
    }
}
