//! k-means clustering of embedding matrices, scored by silhouette and inertia.
//!
//! ```rust
//! use embedding_explorer::clustering::ClusterEvaluator;
//! use embedding_explorer::config::ClusteringConfig;
//! use ndarray::array;
//!
//! let embeddings = array![
//!     [0.0f32, 0.1], [0.1, 0.0], [0.0, 0.0],
//!     [5.0, 5.1], [5.1, 5.0], [5.0, 5.0],
//! ];
//!
//! let result = ClusterEvaluator::new(ClusteringConfig::with_clusters(2))
//!     .evaluate(&embeddings)
//!     .unwrap();
//!
//! assert_eq!(result.labels.len(), 6);
//! assert_eq!(result.labels[0], result.labels[2]);
//! assert_ne!(result.labels[0], result.labels[3]);
//! assert!(result.silhouette > 0.9);
//! ```
//!
//! Runs are reproducible: the same matrix, `k`, and seed always give the same
//! labels.

mod silhouette;

use std::collections::HashSet;

use linfa::traits::{Fit, Predict};
use linfa::DatasetBase;
use linfa_clustering::KMeans;
use ndarray::{Array2, Axis};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;
use tracing::{debug, info, info_span};

use crate::config::ClusteringConfig;
use crate::error::{PipelineError, Result};

pub use silhouette::silhouette_score;
use silhouette::squared_euclidean;

/// Outcome of one k-means run.
#[derive(Debug, Clone)]
pub struct ClusterEvaluation {
    /// Cluster of each input row, in `[0, k)`.
    pub labels: Vec<usize>,
    /// Mean silhouette coefficient, in `[-1, 1]`.
    pub silhouette: f64,
    /// Sum of squared distances from each row to its centroid.
    pub inertia: f64,
    /// `k x D` centroids.
    pub centroids: Array2<f64>,
    /// Number of rows assigned to each cluster.
    pub cluster_sizes: Vec<usize>,
}

impl ClusterEvaluation {
    /// Number of clusters.
    pub fn n_clusters(&self) -> usize {
        self.centroids.nrows()
    }
}

/// Partitions embeddings with seeded k-means and scores the partition.
#[derive(Debug, Clone, Default)]
pub struct ClusterEvaluator {
    config: ClusteringConfig,
}

impl ClusterEvaluator {
    /// Evaluator with the given k-means settings.
    pub fn new(config: ClusteringConfig) -> Self {
        Self { config }
    }

    /// The settings in use.
    pub fn config(&self) -> &ClusteringConfig {
        &self.config
    }

    /// Clusters the rows of `embeddings` into `config.n_clusters` groups.
    ///
    /// Fails with [`PipelineError::InvalidArgument`] before fitting when `k < 2`,
    /// `k > N - 1`, any value is not finite, or the matrix has fewer than `k`
    /// distinct rows (this includes a matrix of identical rows).
    ///
    /// Two distinct rows split into two clusters are the one exception to the
    /// `N - 1` bound: the partition is perfectly separated and scores 1.0.
    pub fn evaluate(&self, embeddings: &Array2<f32>) -> Result<ClusterEvaluation> {
        let k = self.config.n_clusters;
        let span = info_span!("cluster", n = embeddings.nrows(), k);
        let _guard = span.enter();

        validate(embeddings, k)?;

        let records = embeddings.mapv(f64::from);
        let rng = Xoshiro256Plus::seed_from_u64(self.config.seed);
        let dataset = DatasetBase::from(records.clone());

        let model = KMeans::params_with_rng(k, rng)
            .max_n_iterations(self.config.max_iterations)
            .tolerance(self.config.tolerance)
            .n_runs(self.config.n_runs)
            .fit(&dataset)?;

        let labels: Vec<usize> = model.predict(&records).to_vec();
        let centroids = model.centroids().clone();

        let inertia = inertia(&records, &centroids, &labels);
        let silhouette = if records.nrows() == 2 {
            1.0
        } else {
            silhouette_score(&records, &labels)
        };

        let mut cluster_sizes = vec![0usize; k];
        for &label in &labels {
            cluster_sizes[label] += 1;
        }

        debug!(?cluster_sizes, "k-means converged");
        info!(silhouette, inertia, "clustering complete");

        Ok(ClusterEvaluation {
            labels,
            silhouette,
            inertia,
            centroids,
            cluster_sizes,
        })
    }
}

/// Clusters `embeddings` into `n_clusters` groups with the default seed (42).
pub fn evaluate_clustering(embeddings: &Array2<f32>, n_clusters: usize) -> Result<ClusterEvaluation> {
    ClusterEvaluator::new(ClusteringConfig::with_clusters(n_clusters)).evaluate(embeddings)
}

fn validate(embeddings: &Array2<f32>, k: usize) -> Result<()> {
    let n = embeddings.nrows();

    if k < 2 {
        return Err(PipelineError::InvalidArgument(format!(
            "n_clusters must be at least 2, got {k}"
        )));
    }
    let max_k = if n == 2 { 2 } else { n.saturating_sub(1) };
    if k > max_k {
        return Err(PipelineError::InvalidArgument(format!(
            "n_clusters ({k}) must be below the number of embeddings ({n})"
        )));
    }
    if embeddings.ncols() == 0 {
        return Err(PipelineError::InvalidArgument(
            "embeddings have zero dimensions".into(),
        ));
    }
    if embeddings.iter().any(|v| !v.is_finite()) {
        return Err(PipelineError::InvalidArgument(
            "embeddings contain NaN or infinite values".into(),
        ));
    }

    let distinct = distinct_rows(embeddings);
    if distinct < k {
        return Err(PipelineError::InvalidArgument(format!(
            "only {distinct} distinct embeddings, cannot form {k} clusters"
        )));
    }
    Ok(())
}

fn distinct_rows(embeddings: &Array2<f32>) -> usize {
    embeddings
        .axis_iter(Axis(0))
        .map(|row| {
            // +0.0 folds -0.0 onto 0.0
            row.iter().map(|v| (v + 0.0).to_bits()).collect::<Vec<u32>>()
        })
        .collect::<HashSet<_>>()
        .len()
}

fn inertia(records: &Array2<f64>, centroids: &Array2<f64>, labels: &[usize]) -> f64 {
    labels
        .iter()
        .enumerate()
        .map(|(i, &label)| squared_euclidean(records.row(i), centroids.row(label)))
        .sum()
}
