use candle_core::{DType, Device, Tensor};
use ndarray::{Array2, ArrayView1};
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};
use tracing::{debug, info, info_span};

use super::pooling::mean_pool;
use crate::error::{PipelineError, Result};
use crate::models::LoadedModel;
use crate::pipelines::stats::EncoderStats;

/// Texts encoded per forward pass unless configured otherwise.
pub const DEFAULT_BATCH_SIZE: usize = 32;

/// Longer inputs are truncated to this many tokens.
pub const DEFAULT_MAX_LENGTH: usize = 512;

// ============ Output types ============

/// One embedding row per input text, in input order.
#[derive(Debug, Clone)]
pub struct Embeddings {
    /// `N x D` matrix, `D` = the model's hidden size.
    pub matrix: Array2<f32>,
    /// Timing for the whole run.
    pub stats: EncoderStats,
}

impl Embeddings {
    /// Number of rows.
    pub fn len(&self) -> usize {
        self.matrix.nrows()
    }

    /// True for an empty corpus.
    pub fn is_empty(&self) -> bool {
        self.matrix.nrows() == 0
    }

    /// Embedding width.
    pub fn dim(&self) -> usize {
        self.matrix.ncols()
    }

    /// Embedding of the `i`-th input text.
    pub fn row(&self, i: usize) -> ArrayView1<'_, f32> {
        self.matrix.row(i)
    }
}

// ============ Pipeline ============

/// Turns texts into fixed-size vectors by mean-pooling encoder hidden states.
///
/// Construct with [`EmbeddingPipelineBuilder`](super::EmbeddingPipelineBuilder),
/// or wrap an already loaded model with [`EmbeddingPipeline::new`].
///
/// ```rust,no_run
/// use embedding_explorer::embedding::EmbeddingPipelineBuilder;
/// use embedding_explorer::DeviceSelectable;
///
/// # fn main() -> embedding_explorer::error::Result<()> {
/// let pipeline = EmbeddingPipelineBuilder::new("sentence-transformers/all-MiniLM-L6-v2")
///     .batch_size(16)
///     .cpu()
///     .build()?;
///
/// let output = pipeline.run(&["The cat eats.", "The dog sleeps."])?;
/// println!("{} x {} in {:?}", output.len(), output.dim(), output.stats.total_time);
/// # Ok(())
/// # }
/// ```
pub struct EmbeddingPipeline {
    model: LoadedModel,
    tokenizer: Tokenizer,
    batch_size: usize,
}

impl EmbeddingPipeline {
    /// Wraps `model`, configuring its tokenizer for longest-in-batch padding and
    /// truncation at `max_length` tokens.
    pub fn new(model: LoadedModel, batch_size: usize, max_length: usize) -> Result<Self> {
        validate_batching(batch_size, max_length)?;
        let tokenizer = configure_tokenizer(model.tokenizer.clone(), max_length)?;
        Ok(Self {
            model,
            tokenizer,
            batch_size,
        })
    }

    /// Embeds `texts`. Row `i` of the result belongs to `texts[i]`.
    ///
    /// Batches run one after another; any batch failure discards the whole run.
    pub fn run<S: AsRef<str>>(&self, texts: &[S]) -> Result<Embeddings> {
        embed_corpus(&self.model, &self.tokenizer, texts, self.batch_size)
    }

    /// The wrapped model.
    pub fn model(&self) -> &LoadedModel {
        &self.model
    }

    /// Releases the pipeline, handing the model back.
    pub fn into_model(self) -> LoadedModel {
        self.model
    }

    /// Width of the embeddings.
    pub fn hidden_size(&self) -> usize {
        self.model.hidden_size()
    }

    /// Texts per forward pass.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Returns the device (CPU/GPU) the model is running on.
    pub fn device(&self) -> &Device {
        self.model.device()
    }
}

/// Embeds `texts` with `model` without building a pipeline.
///
/// Same contract as [`EmbeddingPipeline::run`], with the default 512-token limit.
pub fn generate_embeddings<S: AsRef<str>>(
    texts: &[S],
    model: &LoadedModel,
    batch_size: usize,
) -> Result<Embeddings> {
    validate_batching(batch_size, DEFAULT_MAX_LENGTH)?;
    let tokenizer = configure_tokenizer(model.tokenizer.clone(), DEFAULT_MAX_LENGTH)?;
    embed_corpus(model, &tokenizer, texts, batch_size)
}

pub(crate) fn validate_batching(batch_size: usize, max_length: usize) -> Result<()> {
    if batch_size == 0 {
        return Err(PipelineError::InvalidArgument(
            "batch_size must be at least 1".into(),
        ));
    }
    if max_length == 0 {
        return Err(PipelineError::InvalidArgument(
            "max_length must be at least 1".into(),
        ));
    }
    Ok(())
}

fn configure_tokenizer(mut tokenizer: Tokenizer, max_length: usize) -> Result<Tokenizer> {
    let pad_id = pad_token_id(&tokenizer);
    let pad_token = tokenizer
        .id_to_token(pad_id)
        .unwrap_or_else(|| "[PAD]".to_string());

    tokenizer.with_padding(Some(PaddingParams {
        strategy: PaddingStrategy::BatchLongest,
        pad_id,
        pad_token,
        ..Default::default()
    }));
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length,
            ..Default::default()
        }))
        .map_err(|e| {
            PipelineError::Tokenization(format!("Failed to set truncation to {max_length}: {e}"))
        })?;

    Ok(tokenizer)
}

fn pad_token_id(tokenizer: &Tokenizer) -> u32 {
    tokenizer
        .get_padding()
        .map(|p| p.pad_id)
        .or_else(|| tokenizer.token_to_id("<pad>"))
        .or_else(|| tokenizer.token_to_id("[PAD]"))
        .unwrap_or(0)
}

fn embed_corpus<S: AsRef<str>>(
    model: &LoadedModel,
    tokenizer: &Tokenizer,
    texts: &[S],
    batch_size: usize,
) -> Result<Embeddings> {
    let span = info_span!("embed", model_id = %model.model_id, texts = texts.len(), batch_size);
    let _guard = span.enter();

    let stats = EncoderStats::start();
    let hidden_size = model.hidden_size();

    let mut flat: Vec<f32> = Vec::with_capacity(texts.len() * hidden_size);
    let mut batches = 0;

    for (batch_index, chunk) in texts.chunks(batch_size).enumerate() {
        let batch: Vec<&str> = chunk.iter().map(|t| t.as_ref()).collect();
        let rows = embed_batch(model, tokenizer, &batch)?;
        debug!(batch = batch_index, rows = rows.len(), "encoded batch");

        for row in rows {
            if row.len() != hidden_size {
                return Err(PipelineError::ModelFormat(format!(
                    "'{}' produced {}-dim vectors but reports hidden size {}",
                    model.model_id,
                    row.len(),
                    hidden_size
                )));
            }
            flat.extend(row);
        }
        batches += 1;
    }

    let matrix = Array2::from_shape_vec((texts.len(), hidden_size), flat)
        .map_err(|e| PipelineError::Unexpected(format!("Embedding matrix shape: {e}")))?;
    let stats = stats.finish(texts.len(), batches);

    info!(
        rows = matrix.nrows(),
        dim = matrix.ncols(),
        elapsed = ?stats.total_time,
        "embedding complete"
    );

    Ok(Embeddings { matrix, stats })
}

fn embed_batch(model: &LoadedModel, tokenizer: &Tokenizer, batch: &[&str]) -> Result<Vec<Vec<f32>>> {
    let encodings = tokenizer.encode_batch(batch.to_vec(), true).map_err(|e| {
        PipelineError::Tokenization(format!(
            "Tokenization failed on batch starting with '{}': {}",
            batch
                .first()
                .map(|t| t.chars().take(50).collect::<String>())
                .unwrap_or_default(),
            e
        ))
    })?;

    let max_len = encodings.iter().map(|e| e.len()).max().unwrap_or(0);
    let pad_id = pad_token_id(tokenizer);

    let mut all_token_ids: Vec<u32> = Vec::with_capacity(batch.len() * max_len);
    let mut all_attention_masks: Vec<u32> = Vec::with_capacity(batch.len() * max_len);

    for encoding in &encodings {
        let mut token_ids = encoding.get_ids().to_vec();
        let mut attention_mask = encoding.get_attention_mask().to_vec();
        token_ids.resize(max_len, pad_id);
        attention_mask.resize(max_len, 0);
        all_token_ids.extend(token_ids);
        all_attention_masks.extend(attention_mask);
    }

    let device = model.device();
    let input_ids = Tensor::from_vec(all_token_ids, (batch.len(), max_len), device)?;
    let attention_mask = Tensor::from_vec(all_attention_masks, (batch.len(), max_len), device)?;

    let hidden = model.encoder.forward(&input_ids, &attention_mask)?;
    let pooled = mean_pool(&hidden, &attention_mask)?;

    Ok(pooled
        .to_device(&Device::Cpu)?
        .to_dtype(DType::F32)?
        .to_vec2::<f32>()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use crate::models::{ArchitectureKind, TextEncoder};
    use crate::testing::{lookup_model, word_level_tokenizer, LookupEncoder};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Succeeds once, then reports the device out of memory.
    struct ExhaustingEncoder {
        inner: LookupEncoder,
        calls: Arc<AtomicUsize>,
    }

    impl TextEncoder for ExhaustingEncoder {
        fn forward(&self, input_ids: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
            if self.calls.fetch_add(1, Ordering::SeqCst) >= 1 {
                return Err(candle_core::Error::Msg(
                    "DriverError(CUDA_ERROR_OUT_OF_MEMORY, \"out of memory\")".into(),
                )
                .into());
            }
            self.inner.forward(input_ids, attention_mask)
        }

        fn hidden_size(&self) -> usize {
            self.inner.hidden_size()
        }

        fn device(&self) -> &Device {
            self.inner.device()
        }

        fn backbone(&self) -> &'static str {
            "exhausting"
        }
    }

    const WORDS: &[&str] = &[
        "chat", "chien", "mange", "dort", "oiseau", "chante", "poisson", "nage", "vite",
    ];

    fn corpus() -> Vec<&'static str> {
        vec![
            "chat mange",
            "chien dort",
            "oiseau chante vite",
            "poisson nage",
            "chat dort",
            "chien mange vite vite",
            "oiseau",
        ]
    }

    #[test]
    fn row_count_is_independent_of_batch_size() {
        let model = lookup_model(WORDS, 8);
        let texts = corpus();

        let reference = generate_embeddings(&texts, &model, texts.len()).unwrap();
        assert_eq!(reference.matrix.dim(), (texts.len(), 8));

        for batch_size in [1, 3, 4, 32] {
            let output = generate_embeddings(&texts, &model, batch_size).unwrap();
            assert_eq!(output.matrix.dim(), (texts.len(), 8), "batch_size={batch_size}");
            for (a, b) in output.matrix.iter().zip(reference.matrix.iter()) {
                assert!((a - b).abs() < 1e-6, "batch_size={batch_size}");
            }
        }
    }

    #[test]
    fn row_i_belongs_to_text_i() {
        let pipeline = EmbeddingPipeline::new(lookup_model(WORDS, 4), 2, DEFAULT_MAX_LENGTH).unwrap();
        let texts = corpus();
        let batch = pipeline.run(&texts).unwrap();

        for (i, text) in texts.iter().enumerate() {
            let single = pipeline.run(&[*text]).unwrap();
            for (a, b) in single.row(0).iter().zip(batch.row(i).iter()) {
                assert!((a - b).abs() < 1e-6, "text {i}");
            }
        }
    }

    #[test]
    fn counts_batches_in_stats() {
        let pipeline = EmbeddingPipeline::new(lookup_model(WORDS, 4), 3, DEFAULT_MAX_LENGTH).unwrap();
        let output = pipeline.run(&corpus()).unwrap();

        assert_eq!(output.stats.items_processed, 7);
        assert_eq!(output.stats.batches, 3);
    }

    #[test]
    fn long_text_is_truncated_not_rejected() {
        let pipeline = EmbeddingPipeline::new(lookup_model(WORDS, 4), 4, 2).unwrap();
        let output = pipeline
            .run(&["chat mange chien dort oiseau chante", "chat mange"])
            .unwrap();

        for (a, b) in output.row(0).iter().zip(output.row(1).iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn empty_corpus_gives_empty_matrix() {
        let model = lookup_model(WORDS, 5);
        let output = generate_embeddings::<&str>(&[], &model, 32).unwrap();

        assert!(output.is_empty());
        assert_eq!(output.dim(), 5);
        assert_eq!(output.stats.batches, 0);
    }

    #[test]
    fn out_of_memory_mid_run_returns_no_rows() {
        let calls = Arc::new(AtomicUsize::new(0));
        let model = LoadedModel::from_parts(
            "test/exhausting",
            ArchitectureKind::Encoder,
            word_level_tokenizer(WORDS),
            Box::new(ExhaustingEncoder {
                inner: LookupEncoder::new(WORDS.len() + 2, 4),
                calls: Arc::clone(&calls),
            }),
        );
        let pipeline = EmbeddingPipeline::new(model, 2, DEFAULT_MAX_LENGTH).unwrap();

        let err = pipeline.run(&corpus()[..5]).unwrap_err();

        assert!(matches!(err, PipelineError::ResourceExhausted(_)), "{err:?}");
        assert_eq!(err.category(), ErrorCategory::ResourceExhaustion);
        // Stopped at the failing batch; batches after it never ran.
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let model = lookup_model(WORDS, 4);
        let err = generate_embeddings(&["chat"], &model, 0).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidArgument(_)));
    }

    #[test]
    fn accepts_owned_strings() {
        let pipeline = EmbeddingPipeline::new(lookup_model(WORDS, 4), 8, DEFAULT_MAX_LENGTH).unwrap();
        let texts: Vec<String> = corpus().into_iter().map(String::from).collect();

        assert_eq!(pipeline.run(&texts).unwrap().len(), texts.len());
    }
}
