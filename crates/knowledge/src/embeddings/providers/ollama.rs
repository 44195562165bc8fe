//! Ollama Embedding Provider
//!
//! Self-hosted embeddings via Ollama's local API (`POST /api/embeddings`).
//! No credential is required; the endpoint comes from the request's base URL.
//!
//! # Example
//! ```no_run
//! use std::time::Duration;
//! use vecbase_knowledge::embeddings::EmbeddingProvider;
//! use vecbase_knowledge::embeddings::providers::ollama::OllamaProvider;
//!
//! # async fn example() -> vecbase_core::AppResult<()> {
//! let provider = OllamaProvider::new(
//!     "http://localhost:11434",
//!     "quentinz/bge-large-zh-v1.5",
//!     1024,
//!     Duration::from_secs(30),
//! )?;
//! let embedding = provider.embed("Hello world").await?;
//! assert_eq!(embedding.len(), 1024);
//! # Ok(())
//! # }
//! ```

use crate::embeddings::provider::validate_embedding;
use crate::embeddings::EmbeddingProvider;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};
use vecbase_core::{AppError, AppResult};

/// Default Ollama endpoint when the request does not name one
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const EMBEDDING_ENDPOINT: &str = "/api/embeddings";

/// Ollama embedding provider using local API
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: Client,
    /// Ollama API base URL
    base_url: String,
    /// Model name (e.g., "quentinz/bge-large-zh-v1.5")
    model: String,
    /// Expected embedding dimensions
    dimensions: usize,
}

/// Request payload for Ollama embeddings API
#[derive(Debug, Clone, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

/// Response from Ollama embeddings API
#[derive(Debug, Clone, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

/// Error response from Ollama API
#[derive(Debug, Clone, Deserialize)]
struct ErrorResponse {
    error: String,
}

impl OllamaProvider {
    /// Create a provider for `model` served at `base_url`.
    ///
    /// # Errors
    /// * `AppError::Connection` - If the HTTP client cannot be built
    pub fn new(
        base_url: &str,
        model: impl Into<String>,
        dimensions: usize,
        timeout: Duration,
    ) -> AppResult<Self> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            AppError::Connection(format!("Failed to create HTTP client for Ollama: {}", e))
        })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.into(),
            dimensions,
        })
    }

    /// Embed single text
    #[instrument(skip(self, text), fields(text_len = text.len(), model = %self.model))]
    async fn embed_single(&self, text: &str) -> AppResult<Vec<f32>> {
        let url = format!("{}{}", self.base_url, EMBEDDING_ENDPOINT);

        let request = EmbeddingRequest {
            model: &self.model,
            prompt: text,
        };

        debug!("Sending embedding request to {}", url);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                AppError::Connection(format!("Failed to send request to Ollama at {}: {}", url, e))
            })?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            let message = serde_json::from_str::<ErrorResponse>(&error_text)
                .map(|e| e.error)
                .unwrap_or(error_text);

            return Err(AppError::Embedding(format!(
                "Ollama API error ({}): {}",
                status, message
            )));
        }

        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| AppError::Embedding(format!("Failed to parse Ollama response: {}", e)))?;

        validate_embedding(self, &body.embedding)?;

        Ok(body.embedding)
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaProvider {
    #[instrument(
        skip(self, text),
        fields(text_len = text.len(), provider = "ollama", model = %self.model)
    )]
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(AppError::Embedding("Cannot embed empty text".to_string()));
        }

        self.embed_single(text).await
    }

    #[instrument(
        skip(self, texts),
        fields(batch_size = texts.len(), provider = "ollama", model = %self.model)
    )]
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        // The embeddings endpoint takes one prompt per call
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer, dimensions: usize) -> OllamaProvider {
        OllamaProvider::new(&server.uri(), "bge", dimensions, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_embed_single() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embeddings"))
            .and(body_json(json!({"model": "bge", "prompt": "Hello, world!"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"embedding": [0.1, 0.2, 0.3]})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let embedding = provider_for(&server, 3).embed("Hello, world!").await.unwrap();
        assert_eq!(embedding, vec![0.1, 0.2, 0.3]);
    }

    #[tokio::test]
    async fn test_embed_batch_calls_once_per_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embeddings"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"embedding": [1.0, 0.0]})),
            )
            .expect(3)
            .mount(&server)
            .await;

        let texts = vec!["one".to_string(), "two".to_string(), "three".to_string()];
        let embeddings = provider_for(&server, 2).embed_batch(&texts).await.unwrap();
        assert_eq!(embeddings.len(), 3);
    }

    #[tokio::test]
    async fn test_dimension_mismatch() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"embedding": [0.1]})))
            .mount(&server)
            .await;

        let err = provider_for(&server, 3).embed("text").await.unwrap_err();
        assert!(matches!(err, AppError::Embedding(ref m) if m.contains("expected 3")));
    }

    #[tokio::test]
    async fn test_api_error_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embeddings"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({"error": "model 'bge' not found"})),
            )
            .mount(&server)
            .await;

        let err = provider_for(&server, 3).embed("text").await.unwrap_err();
        assert!(err.to_string().contains("model 'bge' not found"));
    }

    #[tokio::test]
    async fn test_empty_text() {
        let provider =
            OllamaProvider::new(DEFAULT_OLLAMA_URL, "bge", 3, Duration::from_secs(1)).unwrap();
        assert!(provider.embed("   ").await.is_err());
    }

    #[test]
    fn test_metadata() {
        let provider =
            OllamaProvider::new("http://ollama:11434/", "bge", 1024, Duration::from_secs(1))
                .unwrap();
        assert_eq!(provider.provider_name(), "ollama");
        assert_eq!(provider.model_name(), "bge");
        assert_eq!(provider.dimensions(), 1024);
        assert_eq!(provider.base_url, "http://ollama:11434");
    }
}
