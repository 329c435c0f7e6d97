use candle_core::{DType, Device, Tensor};
use candle_transformers::models::distilbert::{Config, DistilBertModel};

use super::capabilities::TextEncoder;
use crate::error::Result;
use crate::loaders::{self, ModelFiles};

/// DistilBERT encoder (msmarco DistilBERT).
pub struct DistilBertEncoder {
    model: DistilBertModel,
    hidden_size: usize,
    device: Device,
}

impl DistilBertEncoder {
    pub fn load(repo: &str, files: ModelFiles, device: Device) -> Result<Self> {
        let config: Config = files.parse_config(repo)?;
        let hidden_size = loaders::hidden_size(&files.config_json)?;
        // Handles both bare checkpoints and ones nested under "distilbert.".
        let model = DistilBertModel::load(files.vb, &config)?;

        Ok(Self {
            model,
            hidden_size,
            device,
        })
    }
}

/// DistilBERT masks where the mask is 1, so padding becomes 1 and real tokens 0.
/// Shaped (batch, 1, 1, seq) to broadcast over heads and query positions.
fn padding_mask(attention_mask: &Tensor) -> Result<Tensor> {
    let (batch, seq_len) = attention_mask.dims2()?;
    let inverted = attention_mask
        .ones_like()?
        .sub(attention_mask)?
        .to_dtype(DType::U8)?;
    Ok(inverted.reshape((batch, 1, 1, seq_len))?)
}

impl TextEncoder for DistilBertEncoder {
    fn forward(&self, input_ids: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let mask = padding_mask(attention_mask)?;
        let hidden = self.model.forward(input_ids, &mask)?;
        Ok(hidden)
    }

    fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    fn device(&self) -> &Device {
        &self.device
    }

    fn backbone(&self) -> &'static str {
        "distilbert"
    }
}
