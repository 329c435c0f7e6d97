use std::path::PathBuf;
use std::time::Duration;

use candle_core::{DType, Device};
use candle_nn::VarBuilder;
use hf_hub::api::sync::{Api, ApiBuilder};
use serde::de::DeserializeOwned;
use tokenizers::Tokenizer;
use tracing::{debug, warn};

use crate::error::{PipelineError, Result};

#[derive(Debug, Clone)]
pub struct HfLoader {
    pub repo: String,
    pub filename: String,
}

impl HfLoader {
    pub fn new(repo: &str, filename: &str) -> Self {
        Self {
            repo: repo.into(),
            filename: filename.into(),
        }
    }

    pub fn load(&self) -> Result<PathBuf> {
        let hf_api = hf_api()?;
        let hf_repo = hf_api.model(self.repo.clone());

        let max_retries = 3;
        let mut attempts = 0u32;

        // Only concurrent cache lock contention is retried; every other
        // failure goes straight back to the caller.
        for attempt in 0..max_retries {
            match hf_repo.get(self.filename.as_str()) {
                Ok(path) => {
                    debug!(repo = %self.repo, file = %self.filename, path = %path.display(), "resolved hub file");
                    return Ok(path);
                }
                Err(e) => {
                    let error_msg = e.to_string();
                    attempts = attempt + 1;
                    if error_msg.contains("Lock acquisition failed") && attempt < max_retries - 1 {
                        let wait_time = Duration::from_millis(100 * (1 << attempt));
                        warn!(repo = %self.repo, file = %self.filename, ?wait_time, "hub cache locked, waiting");
                        std::thread::sleep(wait_time);
                        continue;
                    }
                    return Err(PipelineError::Download(format!(
                        "Failed to download '{}' from '{}': {}",
                        self.filename, self.repo, error_msg
                    )));
                }
            }
        }

        Err(PipelineError::Download(format!(
            "Download timed out for '{}' from '{}' after {} attempt(s)",
            self.filename, self.repo, attempts
        )))
    }
}

fn hf_api() -> Result<Api> {
    ApiBuilder::new()
        .with_progress(false)
        .build()
        .map_err(|e| PipelineError::Download(format!("Failed to initialize HuggingFace API: {e}")))
}

#[derive(Clone)]
pub struct TokenizerLoader {
    pub tokenizer_file_loader: HfLoader,
}

impl TokenizerLoader {
    pub fn new(repo: &str) -> Self {
        Self {
            tokenizer_file_loader: HfLoader::new(repo, "tokenizer.json"),
        }
    }

    pub fn load(&self) -> Result<Tokenizer> {
        let tokenizer_file_path = self.tokenizer_file_loader.load()?;
        let path_str = tokenizer_file_path.display().to_string();

        Tokenizer::from_file(&tokenizer_file_path).map_err(|e| {
            PipelineError::Tokenization(format!(
                "Failed to load tokenizer from '{}': {}",
                path_str, e
            ))
        })
    }
}

/// Fetches `config.json` plus weights for a model repo and opens them for
/// loading onto `device`.
pub struct WeightsLoader {
    pub repo: String,
}

/// Raw `config.json` text, kept so each backbone can parse its own config type.
pub struct ModelFiles {
    pub config_json: String,
    pub vb: VarBuilder<'static>,
}

impl ModelFiles {
    pub fn parse_config<C: DeserializeOwned>(&self, repo: &str) -> Result<C> {
        serde_json::from_str(&self.config_json).map_err(|e| {
            PipelineError::ModelFormat(format!("Unreadable config.json for '{repo}': {e}"))
        })
    }
}

impl WeightsLoader {
    pub fn new(repo: &str) -> Self {
        Self { repo: repo.into() }
    }

    pub fn load(&self, device: &Device) -> Result<ModelFiles> {
        let config_path = HfLoader::new(&self.repo, "config.json").load()?;
        let weights_path = with_fallback(HfLoader::new(&self.repo, "model.safetensors").load(), || {
            HfLoader::new(&self.repo, "pytorch_model.bin").load()
        })?;

        let config_json = std::fs::read_to_string(&config_path)?;

        let vb = if weights_path.extension().is_some_and(|e| e == "safetensors") {
            unsafe { VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, device)? }
        } else {
            VarBuilder::from_pth(&weights_path, DType::F32, device)?
        };

        Ok(ModelFiles { config_json, vb })
    }
}

/// Returns `primary` if it succeeded, otherwise runs `fallback`. When both fail
/// the error carries both messages.
fn with_fallback(
    primary: Result<PathBuf>,
    fallback: impl FnOnce() -> Result<PathBuf>,
) -> Result<PathBuf> {
    let first = match primary {
        Ok(path) => return Ok(path),
        Err(e) => e,
    };
    debug!(error = %first, "primary weights unavailable, trying fallback");
    fallback().map_err(|second| {
        let message = format!("{second} (after: {first})");
        match second {
            PipelineError::Download(_) => PipelineError::Download(message),
            _ => PipelineError::ModelFormat(message),
        }
    })
}

/// Reads just the `model_type` field from a HuggingFace `config.json`.
pub fn model_type(config_json: &str) -> Result<String> {
    #[derive(serde::Deserialize)]
    struct Header {
        model_type: Option<String>,
    }

    let header: Header = serde_json::from_str(config_json)?;
    header
        .model_type
        .ok_or_else(|| PipelineError::ModelFormat("config.json has no 'model_type'".into()))
}

/// Width of the encoder's token vectors: `hidden_size` for BERT-style configs,
/// `dim` for DistilBERT, `d_model` for T5-style configs.
pub fn hidden_size(config_json: &str) -> Result<usize> {
    #[derive(serde::Deserialize)]
    struct Dims {
        hidden_size: Option<usize>,
        dim: Option<usize>,
        d_model: Option<usize>,
    }

    let dims: Dims = serde_json::from_str(config_json)?;
    dims.hidden_size.or(dims.dim).or(dims.d_model).ok_or_else(|| {
        PipelineError::ModelFormat(
            "config.json has none of 'hidden_size', 'dim', or 'd_model'".into(),
        )
    })
}
