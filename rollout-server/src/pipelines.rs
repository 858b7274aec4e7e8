//! Pipeline definitions loader
//!
//! Reads one `PipelineDescription` per `.yml`/`.yaml` file of a directory.
//! Files are registered in file name order.

use anyhow::{Context, Result};
use rollout_core::domain::PipelineDescription;
use std::path::{Path, PathBuf};

/// Loads every pipeline definition found in `dir`
///
/// A missing directory yields no pipelines.
pub fn load_dir(dir: &Path) -> Result<Vec<PipelineDescription>> {
    if !dir.exists() {
        tracing::warn!("Pipelines directory {} does not exist", dir.display());
        return Ok(Vec::new());
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read pipelines directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| {
            path.is_file()
                && matches!(
                    path.extension().and_then(|ext| ext.to_str()),
                    Some("yml") | Some("yaml")
                )
        })
        .collect();
    files.sort();

    files.iter().map(|path| load_file(path)).collect()
}

/// Loads a single pipeline definition
pub fn load_file(path: &Path) -> Result<PipelineDescription> {
    let yaml = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read pipeline {}", path.display()))?;

    let pipeline: PipelineDescription = serde_yml::from_str(&yaml)
        .with_context(|| format!("Failed to parse pipeline {}", path.display()))?;

    tracing::info!("Loaded pipeline '{}' from {}", pipeline.name, path.display());
    Ok(pipeline)
}
