//! Model identifiers, architectures, and encoder backbones.

// ============ Model capability traits ============

pub(crate) mod capabilities;

// ============ Encoder backbones ============

pub(crate) mod bert;
pub(crate) mod distilbert;
pub(crate) mod t5;
pub(crate) mod xlm_roberta;

// ============ Resolution ============

pub(crate) mod provider;
pub(crate) mod registry;

pub use capabilities::TextEncoder;
pub use provider::{load_model_and_tokenizer, LoadedModel, ModelProvider};
pub use registry::{ArchitectureKind, ModelRegistry};
