//! Embed a handful of program titles, cluster them, and write one scatter
//! plot per projection method.
//!
//! ```text
//! cargo run --example cluster_titles -- [config.json] [out_dir]
//! ```

use anyhow::Result;
use embedding_explorer::clustering::ClusterEvaluator;
use embedding_explorer::config::ExplorerConfig;
use embedding_explorer::embedding::EmbeddingPipelineBuilder;
use embedding_explorer::preprocessing::{Language, TextNormalizer};
use embedding_explorer::projection::{Projector, ReductionMethod};
use embedding_explorer::visualization::{CategoryTable, HtmlRenderer, PointLabels, ScatterFigure, ScatterRenderer};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const TITLES: &[&str] = &[
    "Baccalauréat en génie logiciel",
    "Baccalauréat en génie informatique",
    "Maîtrise en génie logiciel (avec mémoire)",
    "Certificat en programmation et développement logiciel",
    "Baccalauréat en génie électrique",
    "Maîtrise en génie électrique, énergie renouvelable",
    "Doctorat en génie électrique",
    "DESS en énergies renouvelables et efficacité énergétique",
    "Baccalauréat en génie de la construction",
    "Maîtrise en génie de la construction (projet)",
    "Programme court en gestion de projets de construction",
    "Certificat en gestion des infrastructures urbaines",
    "Baccalauréat en génie mécanique",
    "Maîtrise en génie mécanique, conception de produits",
    "Doctorat en génie",
];

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => ExplorerConfig::from_json_file(path)?,
        None => {
            let mut config = ExplorerConfig::default();
            config.embedding.model_id =
                "sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2".to_string();
            config.clustering.n_clusters = 4;
            config.projection.perplexity = 4.0;
            config.projection.n_neighbors = 5;
            config
        }
    };
    let out_dir = PathBuf::from(args.next().unwrap_or_else(|| "out".to_string()));

    let normalizer = TextNormalizer::new(Language::French);
    let cleaned = normalizer.normalize_all(TITLES);

    println!("Building pipeline for {}...", config.embedding.model_id);
    let pipeline = EmbeddingPipelineBuilder::from_config(&config.embedding).build()?;

    let embeddings = pipeline.run(&cleaned)?;
    println!(
        "Embedded {} titles into {} dimensions in {:.2}ms",
        embeddings.len(),
        embeddings.dim(),
        embeddings.stats.total_time.as_secs_f64() * 1000.0
    );

    let clusters = ClusterEvaluator::new(config.clustering.clone()).evaluate(&embeddings.matrix)?;
    println!("\n=== Clustering (k = {}) ===", clusters.n_clusters());
    println!("Silhouette: {:.4}", clusters.silhouette);
    println!("Inertia:    {:.4}", clusters.inertia);
    for cluster in 0..clusters.n_clusters() {
        println!("\nCluster {cluster} ({} titles):", clusters.cluster_sizes[cluster]);
        for (title, _) in TITLES
            .iter()
            .zip(&clusters.labels)
            .filter(|&(_, &label)| label == cluster)
        {
            println!("  {title}");
        }
    }

    let categories = CategoryTable::engineering_fields();
    let by_field = PointLabels::Categories(categories.categorize_all(TITLES));
    let by_cluster = PointLabels::Clusters(clusters.labels.clone());

    println!("\n=== Projections ===");
    for method in ReductionMethod::ALL {
        let mut settings = config.projection.clone();
        settings.method = method;
        let projector = Projector::new(settings);

        let slug = method.name().to_lowercase().replace('-', "");
        let cluster_plot = HtmlRenderer::new(out_dir.join(format!("clusters_{slug}.html")));
        let points = projector.visualize(&embeddings.matrix, &by_cluster, &cluster_plot)?;

        let figure = ScatterFigure::new(format!("Engineering fields - {method}"), &points, &by_field)?
            .with_palette(&categories)
            .with_hover_text(TITLES)?;
        HtmlRenderer::new(out_dir.join(format!("fields_{slug}.html"))).render(&figure)?;

        println!("{method}: wrote {} points to {}", points.nrows(), out_dir.display());
    }

    Ok(())
}
