//! Images module DTOs

use serde::{Deserialize, Serialize};

/// Input of `images.image`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRequest {
    pub name: String,
    pub tag: String,
}

/// Input of `images.versions`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionsRequest {
    pub name: String,
}
