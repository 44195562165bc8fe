//! Query command handler.

use clap::Args;
use vecbase_core::{config::AppConfig, AppResult};
use vecbase_knowledge::{QueryVectorRequest, VectorStoreService};

/// Find the chunks closest to a query text
#[derive(Args, Debug)]
pub struct QueryCommand {
    /// Knowledge base id
    pub kid: String,

    /// Query text
    pub query: String,

    /// Embedding model id; must match the one the chunks were stored with
    #[arg(long)]
    pub embedding_model: String,

    /// Number of chunks to retrieve
    #[arg(short = 'k', long, default_value = "5")]
    pub top_k: usize,

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

impl QueryCommand {
    pub async fn execute(&self, service: &VectorStoreService, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing query command for knowledge base '{}'", self.kid);

        let mut request =
            QueryVectorRequest::new(&self.kid, &self.query, &self.embedding_model, self.top_k)
                .with_model_name(&self.model);
        if let Some(key) = super::flag_or_config(config, self.api_key.as_deref(), "api_key") {
            request = request.with_api_key(key);
        }
        if let Some(url) = super::flag_or_config(config, self.base_url.as_deref(), "base_url") {
            request = request.with_base_url(url);
        }

        let matches = service.query_matches(&request).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&matches)?);
            return Ok(());
        }

        if matches.is_empty() {
            println!("No matches");
            return Ok(());
        }

        for (rank, m) in matches.iter().enumerate() {
            println!(
                "{}. [{}] {}/{}",
                rank + 1,
                m.similarity_percent().as_deref().unwrap_or("n/a"),
                m.doc_id,
                m.fid
            );
            println!("   {}", m.text);
        }

        Ok(())
    }
}
