//! Model capability traits.
//!
//! The embedding pipeline only needs one thing from a model: token-level
//! hidden states from its encoder stack.

use crate::error::Result;
use candle_core::{Device, Tensor};

/// An encoder network that maps token ids to contextual vectors.
///
/// Implementations run inference only; no gradients are tracked by candle.
pub trait TextEncoder: Send + Sync {
    /// Runs the encoder.
    ///
    /// `input_ids` and `attention_mask` are `(batch, seq_len)` `u32` tensors,
    /// right-padded. Returns `(batch, seq_len, hidden_size)` hidden states.
    /// Hidden states at padded positions are unspecified; callers mask them.
    fn forward(&self, input_ids: &Tensor, attention_mask: &Tensor) -> Result<Tensor>;

    /// Width of each token vector.
    fn hidden_size(&self) -> usize;

    /// Device the weights live on.
    fn device(&self) -> &Device;

    /// Short backbone name for logs (`bert`, `t5`, ...).
    fn backbone(&self) -> &'static str;
}
