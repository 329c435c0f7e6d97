use candle_core::{DType, Tensor};

use crate::error::Result;

/// Averages token vectors over the sequence axis, counting only positions
/// where `attention_mask` is 1.
///
/// `hidden` is `(batch, seq_len, hidden)`, `attention_mask` is `(batch, seq_len)`.
/// Returns `(batch, hidden)`. Rows with no unmasked tokens pool to zeros.
pub(crate) fn mean_pool(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let hidden = hidden.to_dtype(DType::F32)?;
    let mask = attention_mask.to_dtype(DType::F32)?.unsqueeze(2)?;

    let summed = hidden.broadcast_mul(&mask)?.sum(1)?;
    let counts = mask.sum(1)?.maximum(1e-9)?;

    Ok(summed.broadcast_div(&counts)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;

    #[test]
    fn averages_only_unmasked_positions() {
        let device = Device::Cpu;
        // batch of 2, seq_len 3, hidden 2
        let hidden = Tensor::new(
            &[
                [[1f32, 2.], [3., 4.], [100., 100.]],
                [[2f32, 2.], [4., 6.], [6., 10.]],
            ],
            &device,
        )
        .unwrap();
        let mask = Tensor::new(&[[1u32, 1, 0], [1, 1, 1]], &device).unwrap();

        let pooled = mean_pool(&hidden, &mask).unwrap().to_vec2::<f32>().unwrap();

        assert_eq!(pooled, vec![vec![2.0, 3.0], vec![4.0, 6.0]]);
    }

    #[test]
    fn fully_masked_row_pools_to_zero() {
        let device = Device::Cpu;
        let hidden = Tensor::new(&[[[5f32, 5.], [7., 7.]]], &device).unwrap();
        let mask = Tensor::new(&[[0u32, 0]], &device).unwrap();

        let pooled = mean_pool(&hidden, &mask).unwrap().to_vec2::<f32>().unwrap();

        assert_eq!(pooled, vec![vec![0.0, 0.0]]);
    }
}
