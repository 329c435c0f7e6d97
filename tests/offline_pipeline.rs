//! Embedding, clustering, and projection with an in-memory encoder.

use candle_core::{Device, Tensor};
use embedding_explorer::clustering::ClusterEvaluator;
use embedding_explorer::config::{ClusteringConfig, ExplorerConfig};
use embedding_explorer::embedding::{EmbeddingPipeline, DEFAULT_MAX_LENGTH};
use embedding_explorer::error::Result;
use embedding_explorer::models::{ArchitectureKind, LoadedModel, TextEncoder};
use embedding_explorer::preprocessing::{Language, TextNormalizer};
use embedding_explorer::projection::{Projector, ReductionMethod};
use embedding_explorer::visualization::{CategoryTable, JsonRenderer, PointLabels, ScatterFigure};
use ndarray::{Array2, Axis};
use tokenizers::Tokenizer;

const VOCAB: &[&str] = &[
    "logiciel", "informatique", "réseaux", "électrique", "énergie", "puissance", "construction",
    "béton", "structures",
];

/// Known words map to a one-hot of their topic (3 topics of 3 words),
/// padding and unknown words to zeros.
struct TopicEncoder {
    device: Device,
}

impl TextEncoder for TopicEncoder {
    fn forward(&self, input_ids: &Tensor, _attention_mask: &Tensor) -> Result<Tensor> {
        let ids = input_ids.to_vec2::<u32>()?;
        let seq_len = ids.first().map_or(0, Vec::len);
        let mut values = Vec::with_capacity(ids.len() * seq_len * 3);
        for row in &ids {
            for &id in row {
                let mut v = [0f32; 3];
                if id >= 2 {
                    v[((id - 2) / 3) as usize] = 1.0;
                }
                values.extend_from_slice(&v);
            }
        }
        Ok(Tensor::from_vec(values, (ids.len(), seq_len, 3), &self.device)?)
    }

    fn hidden_size(&self) -> usize {
        3
    }

    fn device(&self) -> &Device {
        &self.device
    }

    fn backbone(&self) -> &'static str {
        "topic"
    }
}

fn unit_rows(matrix: &Array2<f32>) -> Array2<f32> {
    let norms = matrix.map_axis(Axis(1), |row| row.dot(&row).sqrt().max(1e-12));
    matrix / &norms.insert_axis(Axis(1))
}

fn topic_model() -> LoadedModel {
    let mut vocab = serde_json::Map::new();
    vocab.insert("[PAD]".into(), 0.into());
    vocab.insert("[UNK]".into(), 1.into());
    for (i, word) in VOCAB.iter().enumerate() {
        vocab.insert((*word).into(), (i + 2).into());
    }
    let json = serde_json::json!({
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": [],
        "normalizer": null,
        "pre_tokenizer": { "type": "Whitespace" },
        "post_processor": null,
        "decoder": null,
        "model": { "type": "WordLevel", "vocab": vocab, "unk_token": "[UNK]" }
    });
    let tokenizer = Tokenizer::from_bytes(json.to_string().as_bytes()).unwrap();

    LoadedModel::from_parts(
        "local/topic",
        ArchitectureKind::Encoder,
        tokenizer,
        Box::new(TopicEncoder {
            device: Device::Cpu,
        }),
    )
}

const TITLES: &[&str] = &[
    "Baccalauréat en génie logiciel",
    "Maîtrise en génie logiciel, informatique",
    "Certificat en réseaux et informatique",
    "Baccalauréat en génie électrique",
    "Maîtrise en énergie électrique",
    "Doctorat: puissance et énergie",
    "Baccalauréat en génie de la construction",
    "Maîtrise en structures de béton",
    "Programme court en construction béton",
];

#[test]
fn titles_cluster_by_topic_and_render() -> anyhow::Result<()> {
    let normalizer = TextNormalizer::new(Language::French);
    let texts = normalizer.normalize_all(TITLES);
    assert_eq!(texts[0], "baccalauréat génie logiciel");

    let pipeline = EmbeddingPipeline::new(topic_model(), 4, DEFAULT_MAX_LENGTH)?;
    let embeddings = pipeline.run(&texts)?;
    assert_eq!(embeddings.matrix.dim(), (TITLES.len(), 3));
    assert_eq!(embeddings.stats.batches, 3);

    // Unknown words dilute the mean; direction still gives the topic.
    let unit = unit_rows(&embeddings.matrix);
    let clusters = ClusterEvaluator::new(ClusteringConfig::with_clusters(3)).evaluate(&unit)?;
    assert_eq!(clusters.labels.len(), TITLES.len());
    for topic in 0..3 {
        let first = clusters.labels[topic * 3];
        assert!(clusters.labels[topic * 3..topic * 3 + 3].iter().all(|&l| l == first));
    }
    assert!(clusters.silhouette > 0.0 && clusters.silhouette <= 1.0);

    let projection = Projector::with_method(ReductionMethod::Pca).project(&unit)?;
    assert_eq!(projection.dim(), (TITLES.len(), 2));

    let table = CategoryTable::program_cycles();
    let labels = PointLabels::Categories(table.categorize_all(TITLES));
    let figure = ScatterFigure::new("Programs", &projection, &labels)?
        .with_palette(&table)
        .with_hover_text(TITLES)?;
    assert_eq!(figure.point_count(), TITLES.len());

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("programs.json");
    let clusters_labels = PointLabels::Clusters(clusters.labels);
    Projector::with_method(ReductionMethod::Pca).visualize(
        &unit,
        &clusters_labels,
        &JsonRenderer::new(&path),
    )?;
    let written: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
    assert_eq!(written["title"], "Embeddings Visualization - PCA");
    Ok(())
}

#[test]
fn config_drives_every_stage() -> anyhow::Result<()> {
    let config = ExplorerConfig::from_json_str(
        r#"{
            "clustering": { "n_clusters": 3, "seed": 7 },
            "projection": { "method": "PCA", "n_neighbors": 4 }
        }"#,
    )?;

    assert_eq!(config.projection.n_neighbors, 4);

    let texts = ["logiciel", "réseaux", "énergie", "puissance", "béton", "structures"];
    let embeddings = EmbeddingPipeline::new(topic_model(), 2, 16)?.run(&texts)?;

    let clusters = ClusterEvaluator::new(config.clustering.clone()).evaluate(&embeddings.matrix)?;
    assert_eq!(clusters.cluster_sizes, vec![2, 2, 2]);

    let projection = Projector::new(config.projection.clone()).project(&embeddings.matrix)?;
    assert_eq!(projection.dim(), (6, 2));
    Ok(())
}
