//! Offline stand-ins for hub models, shared by unit tests.

use candle_core::{DType, Device, Tensor};
use tokenizers::Tokenizer;

use crate::error::Result;
use crate::models::{ArchitectureKind, LoadedModel, TextEncoder};

/// Whitespace-split word-level tokenizer over `words`; id 0 is `[PAD]`, 1 is `[UNK]`.
pub(crate) fn word_level_tokenizer(words: &[&str]) -> Tokenizer {
    let mut vocab = serde_json::Map::new();
    vocab.insert("[PAD]".into(), 0.into());
    vocab.insert("[UNK]".into(), 1.into());
    for (i, word) in words.iter().enumerate() {
        vocab.insert((*word).to_string(), (i + 2).into());
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

    Tokenizer::from_bytes(json.to_string().as_bytes()).unwrap()
}

/// Position-independent encoder: each token id maps to a fixed vector.
/// Pooled outputs therefore depend only on the unpadded tokens of a text.
pub(crate) struct LookupEncoder {
    table: Tensor,
    hidden_size: usize,
    device: Device,
}

impl LookupEncoder {
    pub(crate) fn new(vocab_size: usize, hidden_size: usize) -> Self {
        let device = Device::Cpu;
        let values: Vec<f32> = (0..vocab_size * hidden_size)
            .map(|i| ((i * 7919) % 97) as f32 / 97.0 - 0.5)
            .collect();
        let table = Tensor::from_vec(values, (vocab_size, hidden_size), &device).unwrap();
        Self {
            table,
            hidden_size,
            device,
        }
    }
}

impl TextEncoder for LookupEncoder {
    fn forward(&self, input_ids: &Tensor, _attention_mask: &Tensor) -> Result<Tensor> {
        let (batch, seq_len) = input_ids.dims2()?;
        let flat = input_ids.flatten_all()?;
        let hidden = self
            .table
            .index_select(&flat, 0)?
            .reshape((batch, seq_len, self.hidden_size))?
            .to_dtype(DType::F32)?;
        Ok(hidden)
    }

    fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    fn device(&self) -> &Device {
        &self.device
    }

    fn backbone(&self) -> &'static str {
        "lookup"
    }
}

/// A [`LoadedModel`] built from [`word_level_tokenizer`] and [`LookupEncoder`].
pub(crate) fn lookup_model(words: &[&str], hidden_size: usize) -> LoadedModel {
    LoadedModel::from_parts(
        "test/lookup",
        ArchitectureKind::Encoder,
        word_level_tokenizer(words),
        Box::new(LookupEncoder::new(words.len() + 2, hidden_size)),
    )
}
