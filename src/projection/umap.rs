//! UMAP layout through `annembed`.
//!
//! Rows go into an HNSW index, the k-nearest-neighbor graph is read back out
//! of it, and `annembed` lays that graph out in two dimensions. `min_dist` is
//! turned into the exponent of the embedded-space kernel with the usual UMAP
//! curve fit.

use annembed::prelude::*;
use hnsw_rs::prelude::*;
use ndarray::Array2;
use tracing::debug;

use crate::error::{PipelineError, Result};

const MAX_CONNECTIONS: usize = 48;
const EF_CONSTRUCTION: usize = 200;
const MAX_LAYERS: usize = 16;

/// Embeds the rows of `data` (at least two) into two dimensions.
pub(crate) fn fit_transform(
    data: &Array2<f32>,
    n_neighbors: usize,
    min_dist: f64,
) -> Result<Array2<f64>> {
    let n = data.nrows();
    let rows: Vec<Vec<f32>> = data.outer_iter().map(|row| row.to_vec()).collect();

    let n_layers = MAX_LAYERS.min((n as f64).ln().ceil() as usize).max(1);
    let hnsw = Hnsw::<f32, DistL2>::new(MAX_CONNECTIONS, n, n_layers, EF_CONSTRUCTION, DistL2 {});
    let with_ids: Vec<(&Vec<f32>, usize)> = rows.iter().zip(0..n).collect();
    hnsw.parallel_insert(&with_ids);

    let k = n_neighbors.min(n - 1);
    let kgraph = kgraph_from_hnsw_all::<f32, DistL2, f64>(&hnsw, k)
        .map_err(|e| PipelineError::Unexpected(format!("UMAP neighbor graph failed: {e:?}")))?;

    let mut params = EmbedderParams::default();
    params.asked_dim = 2;
    params.b = kernel_exponent(min_dist);
    debug!(n, k, b = params.b, "umap graph built");

    let mut embedder = Embedder::new(&kgraph, params);
    embedder
        .embed()
        .map_err(|e| PipelineError::Unexpected(format!("UMAP layout failed: {e:?}")))?;

    let embedded = embedder.get_embedded_reindexed();
    let shape = embedded.dim();
    let values: Vec<f64> = embedded.iter().copied().collect();
    Array2::from_shape_vec(shape, values)
        .map_err(|e| PipelineError::Unexpected(format!("UMAP output has a bad shape: {e}")))
}

/// Exponent `b` of `1 / (1 + a d^(2b))` fitted to the membership curve that is
/// flat up to `min_dist` and decays exponentially after it (spread 1).
pub(crate) fn kernel_exponent(min_dist: f64) -> f64 {
    let xs: Vec<f64> = (0..300).map(|i| 3.0 * i as f64 / 299.0).collect();
    let ys: Vec<f64> = xs
        .iter()
        .map(|&x| if x < min_dist { 1.0 } else { (min_dist - x).exp() })
        .collect();

    let loss = |a: f64, b: f64| -> f64 {
        xs.iter()
            .zip(&ys)
            .map(|(&x, &y)| (1.0 / (1.0 + a * x.powf(2.0 * b)) - y).powi(2))
            .sum()
    };

    // Coarse grid, then pattern search around the best cell.
    let (mut a, mut b, mut best) = (1.0, 1.0, f64::INFINITY);
    for ai in 1..=50 {
        for bi in 1..=40 {
            let (ca, cb) = (ai as f64 * 0.1, bi as f64 * 0.05);
            let l = loss(ca, cb);
            if l < best {
                (a, b, best) = (ca, cb, l);
            }
        }
    }

    let mut step = 0.05;
    while step > 1e-6 {
        let mut improved = false;
        for (da, db) in [
            (step, 0.0),
            (-step, 0.0),
            (0.0, step),
            (0.0, -step),
            (step, step),
            (-step, -step),
            (step, -step),
            (-step, step),
        ] {
            let (ca, cb) = (a + da, b + db);
            if ca <= 0.0 || cb <= 0.0 {
                continue;
            }
            let l = loss(ca, cb);
            if l < best {
                (a, b, best) = (ca, cb, l);
                improved = true;
            }
        }
        if !improved {
            step /= 2.0;
        }
    }

    b
}
