//! Embed, cluster, and project text corpora with local encoder models.
//!
//! Powered by [Candle](https://github.com/huggingface/candle) for inference and
//! [linfa](https://github.com/rust-ml/linfa) for the numerics. The stages are
//! independent and only exchange in-memory arrays:
//!
//! raw text → [`preprocessing`] → [`embedding`] → [`clustering`] and/or
//! [`projection`] → [`visualization`].
//!
//! ```rust,no_run
//! use embedding_explorer::clustering::evaluate_clustering;
//! use embedding_explorer::embedding::EmbeddingPipelineBuilder;
//! use embedding_explorer::models::ModelRegistry;
//! use embedding_explorer::preprocessing::preprocess_text;
//!
//! # fn main() -> embedding_explorer::error::Result<()> {
//! let texts: Vec<String> = ["Le chat mange.", "Le chien dort."]
//!     .iter()
//!     .map(|t| preprocess_text(t))
//!     .collect();
//!
//! let pipeline = EmbeddingPipelineBuilder::new("google/flan-t5-small")
//!     .registry(ModelRegistry::french())
//!     .build()?;
//! let embeddings = pipeline.run(&texts)?;
//!
//! let clusters = evaluate_clustering(&embeddings.matrix, 2)?;
//! println!("labels {:?}, silhouette {:.3}", clusters.labels, clusters.silhouette);
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]

// ============ Internal API ============

pub(crate) mod loaders;
pub(crate) mod pipelines;

#[cfg(test)]
mod testing;

// ============ Public API ============

pub mod clustering;
pub mod config;
pub mod error;
pub mod models;
pub mod preprocessing;
pub mod projection;
pub mod visualization;

pub use pipelines::embedding;
pub use pipelines::stats::EncoderStats;
pub use pipelines::utils::{DeviceRequest, DeviceSelectable};
