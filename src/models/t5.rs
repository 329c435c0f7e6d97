use std::collections::BTreeMap;
use std::sync::Mutex;

use candle_core::{DType, Device, Tensor};
use candle_transformers::models::t5::{Config, T5EncoderModel};

use super::capabilities::TextEncoder;
use crate::error::{PipelineError, Result};
use crate::loaders::{self, ModelFiles};

/// Encoder stack of a T5 / Flan-T5 checkpoint. The decoder weights are never loaded.
pub struct T5Encoder {
    // candle's T5 stack keeps a mutable position-bias cache, so forward needs &mut.
    model: Mutex<T5EncoderModel>,
    hidden_size: usize,
    device: Device,
}

impl T5Encoder {
    pub fn load(repo: &str, files: ModelFiles, device: Device) -> Result<Self> {
        let config: Config = files.parse_config(repo)?;
        let hidden_size = loaders::hidden_size(&files.config_json)?;
        let model = T5EncoderModel::load(files.vb, &config)?;

        Ok(Self {
            model: Mutex::new(model),
            hidden_size,
            device,
        })
    }
}

/// Row indices grouped by unpadded length, shortest first. Empty rows count as
/// length 1 so they still produce a vector.
fn length_groups(lengths: &[usize]) -> BTreeMap<usize, Vec<usize>> {
    let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (row, &len) in lengths.iter().enumerate() {
        groups.entry(len.max(1)).or_default().push(row);
    }
    groups
}

impl TextEncoder for T5Encoder {
    // candle's T5 encoder takes no attention mask. Rows sharing an unpadded
    // length run as one pass on that prefix and are zero-padded back to the
    // batch width, so no row ever attends to padding.
    fn forward(&self, input_ids: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let (batch, seq_len) = input_ids.dims2()?;
        if seq_len == 0 {
            return Ok(Tensor::zeros(
                (batch, 0, self.hidden_size),
                DType::F32,
                &self.device,
            )?);
        }
        let lengths: Vec<usize> = attention_mask
            .to_dtype(DType::U32)?
            .sum(1)?
            .to_vec1::<u32>()?
            .into_iter()
            .map(|n| n as usize)
            .collect();

        let mut model = self
            .model
            .lock()
            .map_err(|_| PipelineError::Unexpected("T5 encoder lock poisoned".into()))?;

        let mut outputs = Vec::new();
        let mut positions = vec![0u32; batch];
        let mut next = 0u32;
        for (len, rows) in length_groups(&lengths) {
            let len = len.min(seq_len);
            let index: Vec<u32> = rows.iter().map(|&r| r as u32).collect();
            let index = Tensor::new(index.as_slice(), input_ids.device())?;
            let ids = input_ids.narrow(1, 0, len)?.index_select(&index, 0)?.contiguous()?;

            let hidden = model.forward(&ids)?;
            outputs.push(hidden.pad_with_zeros(1, 0, seq_len - len)?);
            for row in rows {
                positions[row] = next;
                next += 1;
            }
        }

        let stacked = Tensor::cat(&outputs, 0)?;
        let order = Tensor::new(positions.as_slice(), stacked.device())?;
        Ok(stacked.index_select(&order, 0)?)
    }

    fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    fn device(&self) -> &Device {
        &self.device
    }

    fn backbone(&self) -> &'static str {
        "t5"
    }
}
