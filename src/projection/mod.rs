//! Two-dimensional projections of embedding matrices.
//!
//! Three methods are available, selected by [`ReductionMethod`]:
//!
//! | Method | Name | Character |
//! |--------|------|-----------|
//! | [`ReductionMethod::Pca`] | `"PCA"` | linear, deterministic, keeps global variance |
//! | [`ReductionMethod::Tsne`] | `"t-SNE"` | nonlinear, keeps local neighborhoods (perplexity 30, 1000 iterations) |
//! | [`ReductionMethod::Umap`] | `"UMAP"` | nonlinear, balances local and global structure (15 neighbors, min_dist 0.1) |
//!
//! t-SNE is seeded, so repeated runs agree. UMAP runs on `annembed`, whose
//! layout is not seeded; only its neighborhood settings are fixed.
//!
//! ```rust,no_run
//! use embedding_explorer::projection::visualize_embeddings;
//! use embedding_explorer::visualization::{HtmlRenderer, PointLabels};
//! # use ndarray::Array2;
//!
//! # fn main() -> embedding_explorer::error::Result<()> {
//! # let embeddings = Array2::<f32>::zeros((100, 384));
//! # let labels = vec![0usize; 100];
//! let renderer = HtmlRenderer::new("out/clusters.html");
//! let points = visualize_embeddings(&embeddings, &PointLabels::Clusters(labels), "UMAP", &renderer)?;
//! assert_eq!(points.dim(), (100, 2));
//! # Ok(())
//! # }
//! ```

mod umap;

use std::fmt;
use std::str::FromStr;

use linfa::traits::{Fit, Predict, Transformer};
use linfa::DatasetBase;
use linfa::ParamGuard;
use linfa_reduction::Pca;
use linfa_tsne::TSneParams;
use ndarray::Array2;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;
use serde::{Deserialize, Serialize};
use tracing::{info, info_span};

use crate::config::ProjectionConfig;
use crate::error::{PipelineError, Result};
use crate::visualization::{PointLabels, ScatterFigure, ScatterRenderer};

// ============ Method selection ============

/// Dimensionality-reduction method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ReductionMethod {
    /// Principal component analysis.
    Pca,
    /// t-distributed stochastic neighbor embedding.
    Tsne,
    /// Uniform manifold approximation and projection.
    Umap,
}

impl ReductionMethod {
    /// All methods, in display order.
    pub const ALL: [ReductionMethod; 3] =
        [ReductionMethod::Pca, ReductionMethod::Tsne, ReductionMethod::Umap];

    /// Canonical name: `"PCA"`, `"t-SNE"`, or `"UMAP"`.
    pub fn name(self) -> &'static str {
        match self {
            ReductionMethod::Pca => "PCA",
            ReductionMethod::Tsne => "t-SNE",
            ReductionMethod::Umap => "UMAP",
        }
    }
}

impl fmt::Display for ReductionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ReductionMethod {
    type Err = PipelineError;

    /// Only the canonical names are accepted; there is no fallback.
    fn from_str(s: &str) -> Result<Self> {
        ReductionMethod::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| PipelineError::UnsupportedMethod(s.to_string()))
    }
}

impl TryFrom<String> for ReductionMethod {
    type Error = PipelineError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ReductionMethod> for String {
    fn from(value: ReductionMethod) -> Self {
        value.name().to_string()
    }
}

// ============ Projector ============

/// Reduces embeddings to two dimensions and optionally renders them.
#[derive(Debug, Clone, Default)]
pub struct Projector {
    config: ProjectionConfig,
}

impl Projector {
    /// Projector with explicit settings.
    pub fn new(config: ProjectionConfig) -> Self {
        Self { config }
    }

    /// Projector for `method` with default parameters.
    pub fn with_method(method: ReductionMethod) -> Self {
        Self::new(ProjectionConfig::for_method(method))
    }

    /// The settings in use.
    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    /// The configured method.
    pub fn method(&self) -> ReductionMethod {
        self.config.method
    }

    /// Projects `N x D` embeddings to an `N x 2` array, row order preserved.
    ///
    /// Requires `N >= 2`, `D >= 2`, and finite values. t-SNE additionally
    /// requires `N - 1 >= 3 * perplexity`.
    pub fn project(&self, embeddings: &Array2<f32>) -> Result<Array2<f64>> {
        let method = self.config.method;
        let span = info_span!("project", %method, n = embeddings.nrows(), d = embeddings.ncols());
        let _guard = span.enter();

        self.validate(embeddings)?;
        let records = embeddings.mapv(f64::from);

        let projection = match method {
            ReductionMethod::Pca => pca(records)?,
            ReductionMethod::Tsne => self.tsne(records)?,
            ReductionMethod::Umap => {
                umap::fit_transform(embeddings, self.config.n_neighbors, self.config.min_dist)?
            }
        };

        info!(rows = projection.nrows(), "projection complete");
        Ok(projection)
    }

    /// Projects `embeddings`, builds a scatter figure colored by `labels`, and
    /// hands it to `renderer`. Returns the projection.
    ///
    /// `labels` must have one entry per embedding row; this is checked before
    /// any projection work.
    pub fn visualize(
        &self,
        embeddings: &Array2<f32>,
        labels: &PointLabels,
        renderer: &dyn ScatterRenderer,
    ) -> Result<Array2<f64>> {
        if labels.len() != embeddings.nrows() {
            return Err(PipelineError::InvalidArgument(format!(
                "{} labels for {} embeddings",
                labels.len(),
                embeddings.nrows()
            )));
        }

        let projection = self.project(embeddings)?;
        let title = format!("Embeddings Visualization - {}", self.config.method);
        let figure = ScatterFigure::new(title, &projection, labels)?;
        renderer.render(&figure)?;

        Ok(projection)
    }

    fn validate(&self, embeddings: &Array2<f32>) -> Result<()> {
        let (n, d) = embeddings.dim();
        if n < 2 {
            return Err(PipelineError::InvalidArgument(format!(
                "need at least 2 embeddings to project, got {n}"
            )));
        }
        if d < 2 {
            return Err(PipelineError::InvalidArgument(format!(
                "need at least 2 dimensions to project, got {d}"
            )));
        }
        if embeddings.iter().any(|v| !v.is_finite()) {
            return Err(PipelineError::InvalidArgument(
                "embeddings contain NaN or infinite values".into(),
            ));
        }

        match self.config.method {
            ReductionMethod::Pca => {}
            ReductionMethod::Tsne => {
                let perplexity = self.config.perplexity;
                if !(perplexity > 0.0) {
                    return Err(PipelineError::InvalidArgument(format!(
                        "perplexity must be positive, got {perplexity}"
                    )));
                }
                if ((n - 1) as f64) < 3.0 * perplexity {
                    return Err(PipelineError::InvalidArgument(format!(
                        "t-SNE with perplexity {perplexity} needs at least {} embeddings, got {n}",
                        (3.0 * perplexity).ceil() as usize + 1
                    )));
                }
            }
            ReductionMethod::Umap => {
                if self.config.n_neighbors < 2 {
                    return Err(PipelineError::InvalidArgument(format!(
                        "n_neighbors must be at least 2, got {}",
                        self.config.n_neighbors
                    )));
                }
                if !(self.config.min_dist >= 0.0) {
                    return Err(PipelineError::InvalidArgument(format!(
                        "min_dist must be non-negative, got {}",
                        self.config.min_dist
                    )));
                }
            }
        }
        Ok(())
    }

    fn tsne(&self, records: Array2<f64>) -> Result<Array2<f64>> {
        let rng = Xoshiro256Plus::seed_from_u64(self.config.seed);
        let params = TSneParams::embedding_size_with_rng(2, rng)
            .perplexity(self.config.perplexity)
            .max_iter(self.config.tsne_iterations)
            .approx_threshold(0.5)
            .check()?;

        Ok(params.transform(records)?)
    }
}

fn pca(records: Array2<f64>) -> Result<Array2<f64>> {
    let dataset = DatasetBase::from(records);
    let model = Pca::params(2).fit(&dataset)?;
    Ok(model.predict(dataset.records()))
}

/// Projects `embeddings` with the method named `method` ("PCA", "t-SNE", or
/// "UMAP") using default parameters, and renders the labeled scatter plot.
///
/// An unrecognized method fails with [`PipelineError::UnsupportedMethod`]
/// before anything else happens.
pub fn visualize_embeddings(
    embeddings: &Array2<f32>,
    labels: &PointLabels,
    method: &str,
    renderer: &dyn ScatterRenderer,
) -> Result<Array2<f64>> {
    let method: ReductionMethod = method.parse()?;
    Projector::with_method(method).visualize(embeddings, labels, renderer)
}
