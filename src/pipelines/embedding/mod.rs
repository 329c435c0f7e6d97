//! Text embedding pipeline.
//!
//! Encode a corpus into an `N x D` matrix: one mean-pooled vector per text,
//! `D` being the model's hidden size. Works with encoder-only models (BERT,
//! XLM-RoBERTa) and with the encoder half of T5 models.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use embedding_explorer::embedding::EmbeddingPipelineBuilder;
//!
//! # fn main() -> embedding_explorer::error::Result<()> {
//! let pipeline = EmbeddingPipelineBuilder::new("sentence-transformers/all-MiniLM-L6-v2").build()?;
//!
//! let output = pipeline.run(&["chat mange", "chien dort"])?;
//! assert_eq!(output.len(), 2);
//! println!("D = {}, took {:?}", output.dim(), output.stats.total_time);
//! # Ok(())
//! # }
//! ```
//!
//! # Batching
//!
//! Texts are split into contiguous batches of `batch_size` (default 32), padded
//! to the longest text in their batch and truncated at 512 tokens. Padding never
//! reaches the pooled vectors, so the result does not depend on the batch size.
//!
//! ```rust,no_run
//! use embedding_explorer::embedding::generate_embeddings;
//! use embedding_explorer::models::load_model_and_tokenizer;
//!
//! # fn main() -> embedding_explorer::error::Result<()> {
//! let model = load_model_and_tokenizer("t5-small")?;
//! let output = generate_embeddings(&["a", "b", "c"], &model, 2)?;
//! assert_eq!(output.stats.batches, 2);
//! # Ok(())
//! # }
//! ```

// ============ Internal API ============

pub(crate) mod builder;
pub(crate) mod pipeline;
pub(crate) mod pooling;

// ============ Public API ============

pub use crate::pipelines::stats::EncoderStats;
pub use builder::EmbeddingPipelineBuilder;
pub use pipeline::{
    generate_embeddings, EmbeddingPipeline, Embeddings, DEFAULT_BATCH_SIZE, DEFAULT_MAX_LENGTH,
};
