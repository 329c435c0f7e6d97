use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Whether a model is a bare encoder or a full encoder-decoder.
///
/// Only the encoder half of a sequence-to-sequence model is ever run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchitectureKind {
    /// Encoder-only model (BERT, XLM-RoBERTa, ...).
    Encoder,
    /// Encoder-decoder model (T5, Flan-T5, ...).
    Seq2Seq,
}

impl fmt::Display for ArchitectureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArchitectureKind::Encoder => "encoder",
            ArchitectureKind::Seq2Seq => "seq2seq",
        };
        write!(f, "{name}")
    }
}

const GENERAL_MODELS: &[(&str, ArchitectureKind)] = &[
    ("sentence-transformers/all-MiniLM-L6-v2", ArchitectureKind::Encoder),
    ("sentence-transformers/all-distilroberta-v1", ArchitectureKind::Encoder),
    ("sentence-transformers/all-MiniLM-L12-v2", ArchitectureKind::Encoder),
    ("sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2", ArchitectureKind::Encoder),
    ("sentence-transformers/paraphrase-multilingual-mpnet-base-v2", ArchitectureKind::Encoder),
    ("sentence-transformers/xlm-r-bert-base-nli-stsb-mean-tokens", ArchitectureKind::Encoder),
    ("sentence-transformers/stsb-xlm-r-multilingual", ArchitectureKind::Encoder),
    ("sentence-transformers/msmarco-distilbert-base-v2", ArchitectureKind::Encoder),
    ("sentence-transformers/msmarco-bert-base-dot-v5", ArchitectureKind::Encoder),
    ("sentence-transformers/roberta-large-v1", ArchitectureKind::Encoder),
    ("sentence-transformers/miniLM-L6", ArchitectureKind::Encoder),
    ("sentence-transformers/miniLM-L3", ArchitectureKind::Encoder),
    ("sentence-transformers/miniLM", ArchitectureKind::Encoder),
    ("t5-small", ArchitectureKind::Seq2Seq),
    ("t5-base", ArchitectureKind::Seq2Seq),
    ("t5-large", ArchitectureKind::Seq2Seq),
    ("google/flan-t5-small", ArchitectureKind::Seq2Seq),
    ("google/flan-t5-base", ArchitectureKind::Seq2Seq),
    ("google/flan-t5-large", ArchitectureKind::Seq2Seq),
];

const FRENCH_MODELS: &[(&str, ArchitectureKind)] = &[
    ("sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2", ArchitectureKind::Encoder),
    ("sentence-transformers/paraphrase-multilingual-mpnet-base-v2", ArchitectureKind::Encoder),
    ("sentence-transformers/xlm-r-bert-base-nli-stsb-mean-tokens", ArchitectureKind::Encoder),
    ("sentence-transformers/stsb-xlm-r-multilingual", ArchitectureKind::Encoder),
    ("t5-small", ArchitectureKind::Seq2Seq),
    ("t5-base", ArchitectureKind::Seq2Seq),
    ("google/flan-t5-small", ArchitectureKind::Seq2Seq),
    ("google/flan-t5-base", ArchitectureKind::Seq2Seq),
];

/// Immutable mapping from model identifier to [`ArchitectureKind`].
///
/// Built once and handed to [`ModelProvider`](crate::models::ModelProvider);
/// there is no process-wide table.
///
/// Encoder entries must resolve to a BERT, DistilBERT, RoBERTa, or XLM-RoBERTa
/// checkpoint. MPNet checkpoints (`all-mpnet-base-v2`) have no candle encoder,
/// so they are not listed and fail with `ModelFormat` if added.
///
/// ```rust
/// use embedding_explorer::models::{ArchitectureKind, ModelRegistry};
///
/// let registry = ModelRegistry::french().with_model("my-org/bert-fr", ArchitectureKind::Encoder);
/// assert_eq!(registry.kind("t5-small").unwrap(), ArchitectureKind::Seq2Seq);
/// assert!(registry.kind("gpt2").is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelRegistry {
    entries: BTreeMap<String, ArchitectureKind>,
}

impl ModelRegistry {
    /// Empty registry. Every lookup fails until models are added.
    pub fn empty() -> Self {
        Self::default()
    }

    /// General-purpose English and multilingual models.
    pub fn general() -> Self {
        Self::from_table(GENERAL_MODELS)
    }

    /// Models suited to French text.
    pub fn french() -> Self {
        Self::from_table(FRENCH_MODELS)
    }

    fn from_table(table: &[(&str, ArchitectureKind)]) -> Self {
        Self {
            entries: table
                .iter()
                .map(|&(id, kind)| (id.to_string(), kind))
                .collect(),
        }
    }

    /// Returns a copy of this registry with one more entry.
    pub fn with_model(mut self, model_id: impl Into<String>, kind: ArchitectureKind) -> Self {
        self.entries.insert(model_id.into(), kind);
        self
    }

    /// Architecture of `model_id`, or [`PipelineError::UnknownModel`].
    pub fn kind(&self, model_id: &str) -> Result<ArchitectureKind> {
        self.entries
            .get(model_id)
            .copied()
            .ok_or_else(|| PipelineError::UnknownModel(model_id.to_string()))
    }

    /// Whether `model_id` is registered.
    pub fn contains(&self, model_id: &str) -> bool {
        self.entries.contains_key(model_id)
    }

    /// Registered identifiers with their architectures, sorted by identifier.
    pub fn iter(&self) -> impl Iterator<Item = (&str, ArchitectureKind)> {
        self.entries.iter().map(|(id, kind)| (id.as_str(), *kind))
    }

    /// Number of registered models.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no models are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_tables_match_their_sources() {
        assert_eq!(ModelRegistry::general().len(), GENERAL_MODELS.len());
        assert_eq!(ModelRegistry::french().len(), FRENCH_MODELS.len());
    }

    #[test]
    fn french_models_are_a_subset_of_general() {
        let general = ModelRegistry::general();
        for (id, kind) in ModelRegistry::french().iter() {
            assert_eq!(general.kind(id).unwrap(), kind, "{id}");
        }
    }

    #[test]
    fn unknown_model_is_rejected() {
        let err = ModelRegistry::general().kind("bert-base-uncased").unwrap_err();
        assert!(matches!(err, PipelineError::UnknownModel(id) if id == "bert-base-uncased"));
    }

    #[test]
    fn with_model_extends_without_touching_original() {
        let base = ModelRegistry::empty();
        let extended = base.clone().with_model("x/y", ArchitectureKind::Encoder);
        assert!(base.is_empty());
        assert!(extended.contains("x/y"));
    }

    #[test]
    fn round_trips_through_json() {
        let registry = ModelRegistry::empty().with_model("t5-small", ArchitectureKind::Seq2Seq);
        let json = serde_json::to_string(&registry).unwrap();
        assert_eq!(json, r#"{"t5-small":"seq2seq"}"#);
    }
}
