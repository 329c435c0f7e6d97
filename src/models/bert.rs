use candle_core::{Device, Tensor};
use candle_transformers::models::bert::{BertModel, Config};

use super::capabilities::TextEncoder;
use crate::error::Result;
use crate::loaders::{self, ModelFiles};

/// BERT-family encoder (MiniLM, multilingual MiniLM, msmarco BERT).
pub struct BertEncoder {
    model: BertModel,
    hidden_size: usize,
    device: Device,
}

impl BertEncoder {
    pub fn load(repo: &str, files: ModelFiles, device: Device) -> Result<Self> {
        let config: Config = files.parse_config(repo)?;
        let hidden_size = loaders::hidden_size(&files.config_json)?;
        // Handles both bare checkpoints and ones nested under "bert.".
        let model = BertModel::load(files.vb, &config)?;

        Ok(Self {
            model,
            hidden_size,
            device,
        })
    }
}

impl TextEncoder for BertEncoder {
    fn forward(&self, input_ids: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let token_type_ids = input_ids.zeros_like()?;
        let hidden = self
            .model
            .forward(input_ids, &token_type_ids, Some(attention_mask))?;
        Ok(hidden)
    }

    fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    fn device(&self) -> &Device {
        &self.device
    }

    fn backbone(&self) -> &'static str {
        "bert"
    }
}
