use super::pipeline::{validate_batching, EmbeddingPipeline, DEFAULT_BATCH_SIZE, DEFAULT_MAX_LENGTH};
use crate::config::EmbeddingConfig;
use crate::error::Result;
use crate::models::{ModelProvider, ModelRegistry};
use crate::pipelines::utils::{DeviceRequest, DeviceSelectable};

/// Builder for [`EmbeddingPipeline`].
///
/// Model identifiers are resolved through [`ModelRegistry::general`] unless a
/// different registry is supplied with [`registry`](Self::registry).
pub struct EmbeddingPipelineBuilder {
    model_id: String,
    registry: ModelRegistry,
    device_request: DeviceRequest,
    batch_size: usize,
    max_length: usize,
}

impl EmbeddingPipelineBuilder {
    /// Starts a builder for `model_id` with batch size 32 and a 512-token limit.
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            registry: ModelRegistry::general(),
            device_request: DeviceRequest::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            max_length: DEFAULT_MAX_LENGTH,
        }
    }

    /// Starts a builder from the embedding section of a run configuration.
    pub fn from_config(config: &EmbeddingConfig) -> Self {
        Self {
            model_id: config.model_id.clone(),
            registry: config.registry.registry(),
            device_request: config.device.clone(),
            batch_size: config.batch_size,
            max_length: config.max_length,
        }
    }

    /// Resolve the identifier through `registry` instead of the general table.
    pub fn registry(mut self, registry: ModelRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Texts per forward pass. Must be at least 1.
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Token limit per text; longer texts are truncated.
    pub fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    /// Loads the model and returns a ready pipeline.
    ///
    /// Argument and identifier errors are reported before anything is fetched.
    pub fn build(self) -> Result<EmbeddingPipeline> {
        validate_batching(self.batch_size, self.max_length)?;

        let provider = ModelProvider::new(self.registry);
        let model = provider.load(&self.model_id, self.device_request)?;

        EmbeddingPipeline::new(model, self.batch_size, self.max_length)
    }
}

impl DeviceSelectable for EmbeddingPipelineBuilder {
    fn device_request_mut(&mut self) -> &mut DeviceRequest {
        &mut self.device_request
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegistryPreset;
    use crate::error::PipelineError;

    #[test]
    fn zero_batch_size_fails_before_loading() {
        // The id is registered, so only the batch check can stop the fetch.
        let err = EmbeddingPipelineBuilder::new("sentence-transformers/all-MiniLM-L6-v2")
            .batch_size(0)
            .cpu()
            .build()
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidArgument(_)));
    }

    #[test]
    fn unregistered_model_fails_before_loading() {
        let err = EmbeddingPipelineBuilder::new("someone/unlisted-model")
            .cpu()
            .build()
            .unwrap_err();
        assert!(matches!(err, PipelineError::UnknownModel(_)));
    }

    #[test]
    fn custom_registry_replaces_general_table() {
        let err = EmbeddingPipelineBuilder::new("sentence-transformers/all-MiniLM-L6-v2")
            .registry(ModelRegistry::empty())
            .cpu()
            .build()
            .unwrap_err();
        assert!(matches!(err, PipelineError::UnknownModel(_)));
    }

    #[test]
    fn from_config_copies_settings() {
        let config = EmbeddingConfig {
            model_id: "t5-small".into(),
            batch_size: 8,
            max_length: 128,
            device: DeviceRequest::Cpu,
            registry: RegistryPreset::French,
        };
        let builder = EmbeddingPipelineBuilder::from_config(&config);

        assert_eq!(builder.model_id, "t5-small");
        assert_eq!(builder.batch_size, 8);
        assert_eq!(builder.max_length, 128);
        assert!(matches!(builder.device_request, DeviceRequest::Cpu));
        assert!(builder.registry.contains("t5-small"));
    }
}
