use candle_core::{Device, Tensor};
use candle_transformers::models::xlm_roberta::{Config, XLMRobertaModel};

use super::capabilities::TextEncoder;
use crate::error::Result;
use crate::loaders::{self, ModelFiles};

/// XLM-RoBERTa encoder (multilingual sentence-transformers checkpoints).
pub struct XlmRobertaEncoder {
    model: XLMRobertaModel,
    hidden_size: usize,
    device: Device,
}

impl XlmRobertaEncoder {
    pub fn load(repo: &str, files: ModelFiles, device: Device) -> Result<Self> {
        let config: Config = files.parse_config(repo)?;
        let hidden_size = loaders::hidden_size(&files.config_json)?;

        // sentence-transformers exports the bare encoder, HF exports nest it under "roberta."
        let model = XLMRobertaModel::new(&config, files.vb.clone())
            .or_else(|_| XLMRobertaModel::new(&config, files.vb.pp("roberta")))?;

        Ok(Self {
            model,
            hidden_size,
            device,
        })
    }
}

impl TextEncoder for XlmRobertaEncoder {
    fn forward(&self, input_ids: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let token_type_ids = input_ids.zeros_like()?;
        let hidden = self.model.forward(
            input_ids,
            attention_mask,
            &token_type_ids,
            None,
            None,
            None,
        )?;
        Ok(hidden)
    }

    fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    fn device(&self) -> &Device {
        &self.device
    }

    fn backbone(&self) -> &'static str {
        "xlm-roberta"
    }
}
