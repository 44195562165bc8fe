//! Embedding provider trait.

use vecbase_core::{AppError, AppResult};

/// Trait for embedding providers.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "ollama", "openai", "trigram")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Generate embeddings for multiple texts in a batch.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Generate embedding for a single text (convenience method).
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::Embedding("No embedding returned".to_string()))
    }
}

/// Reject vectors the store cannot index: wrong length or non-finite components.
pub fn validate_embedding(provider: &dyn EmbeddingProvider, embedding: &[f32]) -> AppResult<()> {
    if embedding.len() != provider.dimensions() {
        return Err(AppError::Embedding(format!(
            "Model '{}' returned {} dimensions, expected {}",
            provider.model_name(),
            embedding.len(),
            provider.dimensions()
        )));
    }

    if embedding.iter().any(|v| !v.is_finite()) {
        return Err(AppError::Embedding(format!(
            "Model '{}' returned a non-finite component",
            provider.model_name()
        )));
    }

    Ok(())
}
