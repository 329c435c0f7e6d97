//! Run configuration.
//!
//! Every stage can be configured in code through its builder or constructor.
//! [`ExplorerConfig`] bundles the same settings in one serde value so a whole
//! run can be described by a JSON file. Missing fields take their defaults.
//!
//! ```rust
//! use embedding_explorer::config::ExplorerConfig;
//! use embedding_explorer::projection::ReductionMethod;
//!
//! let config = ExplorerConfig::from_json_str(
//!     r#"{ "clustering": { "n_clusters": 8 }, "projection": { "method": "UMAP" } }"#,
//! )
//! .unwrap();
//!
//! assert_eq!(config.clustering.n_clusters, 8);
//! assert_eq!(config.clustering.seed, 42);
//! assert_eq!(config.projection.method, ReductionMethod::Umap);
//! assert_eq!(config.embedding.batch_size, 32);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{PipelineError, Result};
use crate::models::ModelRegistry;
use crate::pipelines::embedding::{DEFAULT_BATCH_SIZE, DEFAULT_MAX_LENGTH};
use crate::pipelines::utils::DeviceRequest;
use crate::projection::ReductionMethod;

/// Seed shared by k-means and t-SNE unless overridden.
pub const DEFAULT_SEED: u64 = 42;

/// Settings for a full embed → cluster → project run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    /// Model and batching.
    pub embedding: EmbeddingConfig,
    /// k-means parameters.
    pub clustering: ClusteringConfig,
    /// 2D reduction parameters.
    pub projection: ProjectionConfig,
}

impl ExplorerConfig {
    /// Parses a configuration from JSON text.
    ///
    /// An unrecognized projection method is reported as
    /// [`PipelineError::UnsupportedMethod`]; any other malformed or mistyped
    /// content as [`PipelineError::InvalidConfig`].
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| PipelineError::InvalidConfig(e.to_string()))?;

        if let Some(method) = value.pointer("/projection/method").and_then(Value::as_str) {
            method.parse::<ReductionMethod>()?;
        }

        serde_json::from_value(value).map_err(|e| PipelineError::InvalidConfig(e.to_string()))
    }

    /// Reads and parses a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Serializes the configuration as pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Which built-in model table identifiers are resolved against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistryPreset {
    /// [`ModelRegistry::general`].
    #[default]
    General,
    /// [`ModelRegistry::french`].
    French,
}

impl RegistryPreset {
    /// Builds the registry this preset names.
    pub fn registry(self) -> ModelRegistry {
        match self {
            RegistryPreset::General => ModelRegistry::general(),
            RegistryPreset::French => ModelRegistry::french(),
        }
    }
}

/// Embedding stage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Model identifier, looked up in `registry`.
    pub model_id: String,
    /// Texts per forward pass.
    pub batch_size: usize,
    /// Token limit per text.
    pub max_length: usize,
    /// Where to run inference.
    pub device: DeviceRequest,
    /// Model table to resolve `model_id` against.
    pub registry: RegistryPreset,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model_id: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            max_length: DEFAULT_MAX_LENGTH,
            device: DeviceRequest::Auto,
            registry: RegistryPreset::General,
        }
    }
}

/// k-means settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Number of clusters `k`.
    pub n_clusters: usize,
    /// Seed for centroid initialization.
    pub seed: u64,
    /// Iteration cap per run.
    pub max_iterations: u64,
    /// Convergence threshold on centroid movement.
    pub tolerance: f64,
    /// Independent initializations; the lowest-inertia run is kept.
    pub n_runs: usize,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            n_clusters: 5,
            seed: DEFAULT_SEED,
            max_iterations: 300,
            tolerance: 1e-4,
            n_runs: 10,
        }
    }
}

impl ClusteringConfig {
    /// Default settings with `n_clusters` clusters.
    pub fn with_clusters(n_clusters: usize) -> Self {
        Self {
            n_clusters,
            ..Self::default()
        }
    }
}

/// 2D reduction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    /// PCA, t-SNE, or UMAP.
    pub method: ReductionMethod,
    /// t-SNE perplexity.
    pub perplexity: f64,
    /// t-SNE optimization steps.
    pub tsne_iterations: usize,
    /// UMAP neighborhood size.
    pub n_neighbors: usize,
    /// UMAP minimum distance between embedded points.
    pub min_dist: f64,
    /// Seed for t-SNE. UMAP layout is not seeded.
    pub seed: u64,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            method: ReductionMethod::Pca,
            perplexity: 30.0,
            tsne_iterations: 1000,
            n_neighbors: 15,
            min_dist: 0.1,
            seed: DEFAULT_SEED,
        }
    }
}

impl ProjectionConfig {
    /// Default settings for `method`.
    pub fn for_method(method: ReductionMethod) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }
}
