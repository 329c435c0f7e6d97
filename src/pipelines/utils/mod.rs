use crate::error::{PipelineError, Result};
use candle_core::Device;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Where inference runs. This is the capability-selection strategy handed to
/// the embedding pipeline; results agree across devices up to float tolerance.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceRequest {
    /// Prefer CUDA 0, then Metal 0, otherwise CPU.
    #[default]
    Auto,
    /// Force CPU even if an accelerator is available.
    Cpu,
    /// A specific CUDA device by index. Fails if it cannot be initialized.
    Cuda(usize),
    /// A specific Metal device by index. Fails if it cannot be initialized.
    Metal(usize),
    /// An already constructed device.
    #[serde(skip)]
    Explicit(Device),
}

impl DeviceRequest {
    /// Resolve the request into an actual [`Device`].
    pub fn resolve(self) -> Result<Device> {
        match self {
            DeviceRequest::Auto => {
                let device = if candle_core::utils::cuda_is_available() {
                    Device::new_cuda(0).unwrap_or(Device::Cpu)
                } else if candle_core::utils::metal_is_available() {
                    Device::new_metal(0).unwrap_or(Device::Cpu)
                } else {
                    Device::Cpu
                };
                debug!(device = ?device.location(), "auto-selected device");
                Ok(device)
            }
            DeviceRequest::Cpu => Ok(Device::Cpu),
            DeviceRequest::Cuda(i) => Device::new_cuda(i).map_err(|e| {
                PipelineError::Device(format!(
                    "Failed to init CUDA device {i}: {e}. Try CPU as fallback."
                ))
            }),
            DeviceRequest::Metal(i) => Device::new_metal(i).map_err(|e| {
                PipelineError::Device(format!(
                    "Failed to init Metal device {i}: {e}. Try CPU as fallback."
                ))
            }),
            DeviceRequest::Explicit(device) => Ok(device),
        }
    }
}

/// Convenience methods for builders that carry a [`DeviceRequest`].
pub trait DeviceSelectable: Sized {
    /// Returns a mutable reference to the builder's internal [`DeviceRequest`].
    fn device_request_mut(&mut self) -> &mut DeviceRequest;

    /// Pick the best available device (default).
    fn auto_device(mut self) -> Self {
        *self.device_request_mut() = DeviceRequest::Auto;
        self
    }

    /// Force the pipeline to run on CPU.
    fn cpu(mut self) -> Self {
        *self.device_request_mut() = DeviceRequest::Cpu;
        self
    }

    /// Select a specific CUDA device by index.
    fn cuda(mut self, index: usize) -> Self {
        *self.device_request_mut() = DeviceRequest::Cuda(index);
        self
    }

    /// Select a specific Metal device by index.
    fn metal(mut self, index: usize) -> Self {
        *self.device_request_mut() = DeviceRequest::Metal(index);
        self
    }

    /// Provide an explicit [`Device`].
    fn device(mut self, device: Device) -> Self {
        *self.device_request_mut() = DeviceRequest::Explicit(device);
        self
    }
}
