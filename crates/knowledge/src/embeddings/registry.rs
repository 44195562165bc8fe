//! Supported embedding models and how each one is reached.

use crate::embeddings::providers::ollama::DEFAULT_OLLAMA_URL;
use crate::embeddings::providers::{OllamaProvider, OpenAiProvider, TrigramProvider};
use crate::embeddings::EmbeddingProvider;
use crate::types::ApiKey;
use std::sync::Arc;
use std::time::Duration;
use vecbase_core::{AppError, AppResult};

/// How a model is served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// Self-hosted Ollama, no credential
    Local,
    /// OpenAI-compatible API behind a bearer key
    Hosted,
    /// Computed in process
    Builtin,
}

/// One row of the model table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelSpec {
    pub id: &'static str,
    pub kind: ProviderKind,
    pub dimensions: usize,
}

/// Every model id a request may name. Lookup is by exact id.
pub const SUPPORTED_MODELS: &[ModelSpec] = &[
    ModelSpec {
        id: "quentinz/bge-large-zh-v1.5",
        kind: ProviderKind::Local,
        dimensions: 1024,
    },
    ModelSpec {
        id: "baai/bge-m3",
        kind: ProviderKind::Hosted,
        dimensions: 1024,
    },
    ModelSpec {
        id: super::providers::trigram::TRIGRAM_MODEL,
        kind: ProviderKind::Builtin,
        dimensions: 384,
    },
];

impl ModelSpec {
    pub fn lookup(model_id: &str) -> Option<&'static ModelSpec> {
        SUPPORTED_MODELS.iter().find(|spec| spec.id == model_id)
    }
}

/// A resolved embedding model, ready to build its provider.
#[derive(Debug, Clone)]
pub enum EmbeddingModel {
    Local {
        endpoint: String,
        model: String,
        dimensions: usize,
    },
    Hosted {
        endpoint: String,
        model: String,
        api_key: ApiKey,
        dimensions: usize,
    },
    Builtin {
        model: String,
        dimensions: usize,
    },
}

impl EmbeddingModel {
    /// Resolve a model id with the credential and endpoint supplied on the request.
    ///
    /// Empty strings count as absent.
    ///
    /// # Errors
    /// * `AppError::UnsupportedModel` - The id is not in [`SUPPORTED_MODELS`]
    /// * `AppError::Config` - A hosted model without an API key or base URL
    pub fn resolve(
        model_id: &str,
        api_key: Option<&ApiKey>,
        base_url: Option<&str>,
    ) -> AppResult<Self> {
        let spec = ModelSpec::lookup(model_id)
            .ok_or_else(|| AppError::UnsupportedModel(model_id.to_string()))?;

        let base_url = base_url.map(str::trim).filter(|url| !url.is_empty());
        let api_key = api_key.filter(|key| !key.expose().trim().is_empty());

        match spec.kind {
            ProviderKind::Local => Ok(Self::Local {
                endpoint: base_url.unwrap_or(DEFAULT_OLLAMA_URL).to_string(),
                model: spec.id.to_string(),
                dimensions: spec.dimensions,
            }),
            ProviderKind::Hosted => {
                let api_key = api_key.cloned().ok_or_else(|| {
                    AppError::Config(format!("Embedding model '{}' requires an API key", spec.id))
                })?;
                let endpoint = base_url.ok_or_else(|| {
                    AppError::Config(format!("Embedding model '{}' requires a base URL", spec.id))
                })?;

                Ok(Self::Hosted {
                    endpoint: endpoint.to_string(),
                    model: spec.id.to_string(),
                    api_key,
                    dimensions: spec.dimensions,
                })
            }
            ProviderKind::Builtin => Ok(Self::Builtin {
                model: spec.id.to_string(),
                dimensions: spec.dimensions,
            }),
        }
    }

    pub fn model_id(&self) -> &str {
        match self {
            Self::Local { model, .. }
            | Self::Hosted { model, .. }
            | Self::Builtin { model, .. } => model,
        }
    }

    pub fn dimensions(&self) -> usize {
        match self {
            Self::Local { dimensions, .. }
            | Self::Hosted { dimensions, .. }
            | Self::Builtin { dimensions, .. } => *dimensions,
        }
    }

    /// Build the provider that serves this model.
    pub fn create_provider(&self, timeout: Duration) -> AppResult<Arc<dyn EmbeddingProvider>> {
        tracing::debug!(
            "Creating embedding provider for model '{}' ({} dimensions)",
            self.model_id(),
            self.dimensions()
        );

        match self {
            Self::Local {
                endpoint,
                model,
                dimensions,
            } => Ok(Arc::new(OllamaProvider::new(
                endpoint,
                model.clone(),
                *dimensions,
                timeout,
            )?)),
            Self::Hosted {
                endpoint,
                model,
                api_key,
                dimensions,
            } => Ok(Arc::new(OpenAiProvider::new(
                endpoint,
                api_key.clone(),
                model.clone(),
                *dimensions,
                timeout,
            )?)),
            Self::Builtin { dimensions, .. } => Ok(Arc::new(TrigramProvider::new(*dimensions))),
        }
    }
}
