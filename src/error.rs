//! Error types for this crate.
//!
//! All fallible operations return [`Result<T>`] which uses [`PipelineError`] as the error type.

use thiserror::Error;

/// A [`Result`](std::result::Result) alias using [`PipelineError`] as the error type.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// The unified error type for all crate errors.
///
/// Every error is surfaced as soon as it is detected. Nothing in this crate retries
/// or substitutes a default result.
///
/// # Example
///
/// ```rust,no_run
/// use embedding_explorer::error::{ErrorCategory, PipelineError};
///
/// fn handle_error(e: PipelineError) {
///     match e.category() {
///         ErrorCategory::Configuration => {
///             // Unknown model id or reduction method - fix the call site
///         }
///         ErrorCategory::InvalidArgument => {
///             // Input does not fit the operation (e.g. too many clusters)
///         }
///         ErrorCategory::ResourceExhaustion => {
///             // Device ran out of memory - use a smaller batch size
///         }
///         ErrorCategory::ExternalFetch => {
///             // Hub or network failure
///         }
///         _ => eprintln!("Internal error: {e}"),
///     }
/// }
/// ```
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum PipelineError {
    /// Model identifier is not in the registry.
    #[error("unknown model '{0}'")]
    UnknownModel(String),

    /// Reduction method name is not one of PCA, t-SNE, UMAP.
    #[error("unsupported method '{0}'")]
    UnsupportedMethod(String),

    /// Configuration text that does not describe a valid run.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Input is outside the range an operation accepts.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Device memory exhausted while running a batch.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    /// Network or download failure.
    #[error("{0}")]
    Download(String),

    /// Tokenization failure. Check input text or tokenizer file.
    #[error("{0}")]
    Tokenization(String),

    /// Weights or config that do not map onto a supported encoder.
    #[error("{0}")]
    ModelFormat(String),

    /// Device initialization failure.
    #[error("{0}")]
    Device(String),

    /// Filesystem failure while writing figures or reading config.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Internal error. Report if seen.
    #[error("{0}")]
    Unexpected(String),
}

/// Coarse error taxonomy, for callers that branch on the kind of failure rather
/// than the exact variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad identifier, method name, or config file, detected before any expensive work.
    Configuration,
    /// Argument out of range for the given input.
    InvalidArgument,
    /// Out of device memory.
    ResourceExhaustion,
    /// Model, tokenizer, or weight retrieval failed.
    ExternalFetch,
    /// Anything else.
    Internal,
}

impl PipelineError {
    /// The taxonomy bucket this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            PipelineError::UnknownModel(_)
            | PipelineError::UnsupportedMethod(_)
            | PipelineError::InvalidConfig(_) => ErrorCategory::Configuration,
            PipelineError::InvalidArgument(_) => ErrorCategory::InvalidArgument,
            PipelineError::ResourceExhausted(_) => ErrorCategory::ResourceExhaustion,
            PipelineError::Download(_) | PipelineError::ModelFormat(_) => {
                ErrorCategory::ExternalFetch
            }
            PipelineError::Tokenization(_)
            | PipelineError::Device(_)
            | PipelineError::Io(_)
            | PipelineError::Unexpected(_) => ErrorCategory::Internal,
        }
    }
}

impl From<hf_hub::api::sync::ApiError> for PipelineError {
    fn from(value: hf_hub::api::sync::ApiError) -> Self {
        PipelineError::Download(format!("HuggingFace API error: {}", value))
    }
}

impl From<candle_core::Error> for PipelineError {
    fn from(value: candle_core::Error) -> Self {
        let message = value.to_string();
        if is_out_of_memory(&message) {
            PipelineError::ResourceExhausted(message)
        } else {
            PipelineError::Unexpected(message)
        }
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(value: serde_json::Error) -> Self {
        PipelineError::Unexpected(value.to_string())
    }
}

impl From<linfa_clustering::KMeansError> for PipelineError {
    fn from(value: linfa_clustering::KMeansError) -> Self {
        PipelineError::Unexpected(format!("k-means failed: {value}"))
    }
}

impl From<linfa_reduction::ReductionError> for PipelineError {
    fn from(value: linfa_reduction::ReductionError) -> Self {
        PipelineError::Unexpected(format!("PCA failed: {value}"))
    }
}

impl From<linfa_tsne::TSneError> for PipelineError {
    fn from(value: linfa_tsne::TSneError) -> Self {
        PipelineError::Unexpected(format!("t-SNE failed: {value}"))
    }
}

// CUDA reports CUDA_ERROR_OUT_OF_MEMORY, Metal and the allocator say "out of memory".
fn is_out_of_memory(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("out of memory") || lower.contains("out_of_memory")
}
