use candle_core::Device;
use tokenizers::Tokenizer;
use tracing::info;

use super::bert::BertEncoder;
use super::capabilities::TextEncoder;
use super::distilbert::DistilBertEncoder;
use super::registry::{ArchitectureKind, ModelRegistry};
use super::t5::T5Encoder;
use super::xlm_roberta::XlmRobertaEncoder;
use crate::error::{PipelineError, Result};
use crate::loaders::{self, TokenizerLoader, WeightsLoader};
use crate::pipelines::utils::DeviceRequest;

/// A tokenizer and encoder ready for inference.
///
/// Dropping this value frees the model's device memory.
pub struct LoadedModel {
    /// Identifier the model was resolved from.
    pub model_id: String,
    /// Registered architecture.
    pub kind: ArchitectureKind,
    /// Tokenizer loaded from the model repo.
    pub tokenizer: Tokenizer,
    /// Encoder network.
    pub encoder: Box<dyn TextEncoder>,
}

impl LoadedModel {
    /// Assembles a model from parts that were obtained elsewhere
    /// (local files, a custom encoder, tests).
    pub fn from_parts(
        model_id: impl Into<String>,
        kind: ArchitectureKind,
        tokenizer: Tokenizer,
        encoder: Box<dyn TextEncoder>,
    ) -> Self {
        Self {
            model_id: model_id.into(),
            kind,
            tokenizer,
            encoder,
        }
    }

    /// Width of the embeddings this model produces.
    pub fn hidden_size(&self) -> usize {
        self.encoder.hidden_size()
    }

    /// Device the encoder runs on.
    pub fn device(&self) -> &Device {
        self.encoder.device()
    }
}

impl std::fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModel")
            .field("model_id", &self.model_id)
            .field("kind", &self.kind)
            .field("backbone", &self.encoder.backbone())
            .field("hidden_size", &self.encoder.hidden_size())
            .finish()
    }
}

/// Resolves model identifiers to a (tokenizer, encoder) pair.
///
/// ```rust,no_run
/// use embedding_explorer::models::{ModelProvider, ModelRegistry};
/// use embedding_explorer::DeviceRequest;
///
/// # fn main() -> embedding_explorer::error::Result<()> {
/// let provider = ModelProvider::new(ModelRegistry::french());
/// let model = provider.load("t5-small", DeviceRequest::Cpu)?;
/// println!("{} -> {} dims", model.model_id, model.hidden_size());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ModelProvider {
    registry: ModelRegistry,
}

impl ModelProvider {
    /// Creates a provider over `registry`.
    pub fn new(registry: ModelRegistry) -> Self {
        Self { registry }
    }

    /// The registry lookups go through.
    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Loads tokenizer and encoder weights for `model_id`.
    ///
    /// Unknown identifiers fail before anything is downloaded. Fetch errors are
    /// returned unchanged; nothing is retried beyond hub cache-lock contention.
    pub fn load(&self, model_id: &str, device_request: DeviceRequest) -> Result<LoadedModel> {
        let kind = self.registry.kind(model_id)?;
        let device = device_request.resolve()?;

        info!(model_id, %kind, device = ?device.location(), "loading model");

        let tokenizer = TokenizerLoader::new(model_id).load()?;
        let files = WeightsLoader::new(model_id).load(&device)?;
        let model_type = loaders::model_type(&files.config_json)?;

        let backbone = backbone_for(kind, &model_type).ok_or_else(|| {
            PipelineError::ModelFormat(format!(
                "'{model_id}' is registered as {kind} but its backbone '{model_type}' is not supported"
            ))
        })?;

        let encoder: Box<dyn TextEncoder> = match backbone {
            Backbone::Bert => Box::new(BertEncoder::load(model_id, files, device)?),
            Backbone::DistilBert => Box::new(DistilBertEncoder::load(model_id, files, device)?),
            Backbone::XlmRoberta => Box::new(XlmRobertaEncoder::load(model_id, files, device)?),
            Backbone::T5 => Box::new(T5Encoder::load(model_id, files, device)?),
        };

        info!(
            model_id,
            backbone = encoder.backbone(),
            hidden_size = encoder.hidden_size(),
            "model ready"
        );

        Ok(LoadedModel {
            model_id: model_id.to_string(),
            kind,
            tokenizer,
            encoder,
        })
    }
}

/// Encoder implementation a checkpoint is loaded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Backbone {
    Bert,
    DistilBert,
    XlmRoberta,
    T5,
}

/// Picks the backbone for a registered kind and the `model_type` in config.json.
///
/// RoBERTa checkpoints share XLM-RoBERTa's layout and load through it.
fn backbone_for(kind: ArchitectureKind, model_type: &str) -> Option<Backbone> {
    match (kind, model_type) {
        (ArchitectureKind::Encoder, "bert") => Some(Backbone::Bert),
        (ArchitectureKind::Encoder, "distilbert") => Some(Backbone::DistilBert),
        (ArchitectureKind::Encoder, "roberta" | "xlm-roberta") => Some(Backbone::XlmRoberta),
        (ArchitectureKind::Seq2Seq, "t5") => Some(Backbone::T5),
        _ => None,
    }
}

/// Loads `model_id` from the general-purpose registry on the best available device.
pub fn load_model_and_tokenizer(model_id: &str) -> Result<LoadedModel> {
    ModelProvider::new(ModelRegistry::general()).load(model_id, DeviceRequest::Auto)
}
