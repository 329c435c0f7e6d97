//! Score every model in the French registry by how well k-means separates
//! the same titles in its embedding space.
//!
//! ```text
//! cargo run --example compare_models -- [n_clusters]
//! ```

use anyhow::Result;
use embedding_explorer::clustering::evaluate_clustering;
use embedding_explorer::embedding::EmbeddingPipelineBuilder;
use embedding_explorer::models::ModelRegistry;
use embedding_explorer::preprocessing::preprocess_text;
use embedding_explorer::DeviceSelectable;
use tracing::warn;
use tracing_subscriber::EnvFilter;

const TITLES: &[&str] = &[
    "Baccalauréat en génie logiciel",
    "Maîtrise en génie logiciel",
    "Certificat en développement logiciel",
    "Baccalauréat en génie électrique",
    "Maîtrise en génie électrique",
    "DESS en énergie électrique",
    "Baccalauréat en génie de la construction",
    "Maîtrise en génie de la construction",
    "Programme court en gestion de la construction",
];

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let n_clusters: usize = match std::env::args().nth(1) {
        Some(arg) => arg.parse()?,
        None => 3,
    };

    let cleaned: Vec<String> = TITLES.iter().map(|t| preprocess_text(t)).collect();
    let registry = ModelRegistry::french();

    println!("{:<62} {:>8} {:>10} {:>10}", "model", "dim", "silhouette", "ms");
    let mut best: Option<(String, f64)> = None;

    for (model_id, kind) in registry.iter() {
        let pipeline = match EmbeddingPipelineBuilder::new(model_id)
            .registry(registry.clone())
            .cpu()
            .build()
        {
            Ok(pipeline) => pipeline,
            Err(e) => {
                warn!(model_id, error = %e, "skipping model");
                continue;
            }
        };

        let embeddings = pipeline.run(&cleaned)?;
        let result = evaluate_clustering(&embeddings.matrix, n_clusters)?;

        println!(
            "{:<62} {:>8} {:>10.4} {:>10.1}",
            format!("{model_id} ({kind})"),
            embeddings.dim(),
            result.silhouette,
            embeddings.stats.total_time.as_secs_f64() * 1000.0
        );

        if best.as_ref().map_or(true, |(_, score)| result.silhouette > *score) {
            best = Some((model_id.to_string(), result.silhouette));
        }
    }

    match best {
        Some((model_id, score)) => println!("\nBest separation: {model_id} ({score:.4})"),
        None => println!("\nNo model could be loaded."),
    }

    Ok(())
}
