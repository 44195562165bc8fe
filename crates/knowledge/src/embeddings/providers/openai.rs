//! OpenAI-compatible hosted embedding provider.
//!
//! Calls `POST {base_url}/embeddings` with a bearer API key. The base URL
//! includes the API version segment, e.g. `https://api.openai.com/v1`, so any
//! OpenAI-compatible gateway serving models such as `baai/bge-m3` works.

use crate::embeddings::provider::validate_embedding;
use crate::embeddings::EmbeddingProvider;
use crate::types::ApiKey;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};
use vecbase_core::{AppError, AppResult};

#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    client: Client,
    base_url: String,
    api_key: ApiKey,
    model: String,
    dimensions: usize,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl OpenAiProvider {
    pub fn new(
        base_url: &str,
        api_key: ApiKey,
        model: impl Into<String>,
        dimensions: usize,
        timeout: Duration,
    ) -> AppResult<Self> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            AppError::Connection(format!("Failed to create HTTP client for embeddings: {}", e))
        })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model: model.into(),
            dimensions,
        })
    }

    fn embeddings_url(&self) -> String {
        format!("{}/embeddings", self.base_url)
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiProvider {
    fn provider_name(&self) -> &str {
        "openai"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    #[instrument(
        skip(self, texts),
        fields(batch_size = texts.len(), provider = "openai", model = %self.model)
    )]
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = self.embeddings_url();
        debug!("Sending embedding request to {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose())
            .json(&EmbeddingRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await
            .map_err(|e| {
                AppError::Connection(format!("Failed to reach embedding endpoint {}: {}", url, e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            let message = serde_json::from_str::<ErrorEnvelope>(&error_text)
                .map(|e| e.error.message)
                .unwrap_or(error_text);

            return Err(AppError::Embedding(format!(
                "Embedding API error ({}): {}",
                status, message
            )));
        }

        let mut body: EmbeddingResponse = response.json().await.map_err(|e| {
            AppError::Embedding(format!("Failed to parse embedding response: {}", e))
        })?;

        if body.data.len() != texts.len() {
            return Err(AppError::Embedding(format!(
                "Requested {} embeddings, received {}",
                texts.len(),
                body.data.len()
            )));
        }

        body.data.sort_by_key(|d| d.index);

        let mut embeddings = Vec::with_capacity(body.data.len());
        for data in body.data {
            validate_embedding(self, &data.embedding)?;
            embeddings.push(data.embedding);
        }

        Ok(embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer) -> OpenAiProvider {
        OpenAiProvider::new(
            &format!("{}/v1", server.uri()),
            ApiKey::new("test-api-key"),
            "baai/bge-m3",
            2,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_embed_sends_bearer_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .and(header("authorization", "Bearer test-api-key"))
            .and(body_partial_json(json!({"model": "baai/bge-m3", "input": ["hello"]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "baai/bge-m3",
                "data": [{"index": 0, "embedding": [0.5, 0.5], "object": "embedding"}],
                "usage": {"prompt_tokens": 1, "total_tokens": 1}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let embedding = provider_for(&server).embed("hello").await.unwrap();
        assert_eq!(embedding, vec![0.5, 0.5]);
    }

    #[tokio::test]
    async fn test_batch_reordered_by_index() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    {"index": 1, "embedding": [0.0, 1.0]},
                    {"index": 0, "embedding": [1.0, 0.0]}
                ]
            })))
            .mount(&server)
            .await;

        let texts = vec!["first".to_string(), "second".to_string()];
        let embeddings = provider_for(&server).embed_batch(&texts).await.unwrap();
        assert_eq!(embeddings, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[tokio::test]
    async fn test_error_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": {"message": "Invalid API key", "type": "auth"}
            })))
            .mount(&server)
            .await;

        let err = provider_for(&server).embed("hello").await.unwrap_err();
        assert!(matches!(err, AppError::Embedding(ref m) if m.contains("Invalid API key")));
    }

    #[tokio::test]
    async fn test_count_mismatch() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .mount(&server)
            .await;

        assert!(provider_for(&server).embed("hello").await.is_err());
    }
}
