//! Store command handler.

use clap::Args;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use vecbase_core::{config::AppConfig, AppError, AppResult};
use vecbase_knowledge::{StoreEmbeddingRequest, VectorStoreService};

/// Embed and store the chunks of a document
#[derive(Args, Debug)]
pub struct StoreCommand {
    /// Knowledge base id
    pub kid: String,

    /// Document id the chunks belong to
    #[arg(long = "doc")]
    pub doc_id: String,

    /// JSON file with an array of `{"fid": ..., "text": ...}` objects
    #[arg(long)]
    pub chunks: PathBuf,

    /// Embedding model id (e.g. quentinz/bge-large-zh-v1.5, baai/bge-m3, trigram-v1)
    #[arg(long)]
    pub embedding_model: String,

    /// Vector model name recorded with the schema request
    #[arg(long, default_value = "")]
    pub model: String,

    /// API key for hosted embedding models (falls back to embedding.api_key)
    #[arg(long, env = "VECBASE_EMBEDDING_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Embedding provider endpoint (falls back to embedding.base_url)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Deserialize)]
struct ChunkEntry {
    fid: String,
    text: String,
}

fn read_chunks(path: &Path) -> AppResult<(Vec<String>, Vec<String>)> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        AppError::InvalidRequest(format!("Failed to read chunks file {:?}: {}", path, e))
    })?;
    let entries: Vec<ChunkEntry> = serde_json::from_str(&contents)?;

    Ok(entries.into_iter().map(|e| (e.text, e.fid)).unzip())
}

impl StoreCommand {
    pub async fn execute(&self, service: &VectorStoreService, config: &AppConfig) -> AppResult<()> {
        tracing::info!(
            "Executing store command for knowledge base '{}', document '{}'",
            self.kid,
            self.doc_id
        );

        let (chunks, fids) = read_chunks(&self.chunks)?;

        let mut request = StoreEmbeddingRequest::new(&self.kid, &self.doc_id, &self.embedding_model)
            .with_model_name(&self.model)
            .with_chunks(chunks, fids);
        if let Some(key) = super::flag_or_config(config, self.api_key.as_deref(), "api_key") {
            request = request.with_api_key(key);
        }
        if let Some(url) = super::flag_or_config(config, self.base_url.as_deref(), "base_url") {
            request = request.with_base_url(url);
        }

        let stats = service.store_embeddings(&request).await?;

        if self.json {
            let output = serde_json::json!({
                "kid": self.kid,
                "docId": self.doc_id,
                "recordsWritten": stats.records_written,
                "durationSecs": stats.duration_secs,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!(
                "Stored {} records for document '{}' in {:.2}s",
                stats.records_written, self.doc_id, stats.duration_secs
            );
        }

        Ok(())
    }
}
