//! Nearest-neighbour queries over a knowledge base.

use crate::embeddings::{EmbeddingModel, EmbeddingProvider};
use crate::schema::SchemaManager;
use crate::session::StoreSession;
use crate::types::{QueryMatch, QueryVectorRequest, SchemaStatus};
use std::time::{Duration, Instant};
use tracing::{error, info, instrument, warn};
use vecbase_core::config::DEFAULT_TIMEOUT_SECS;
use vecbase_core::AppResult;

#[derive(Debug, Clone)]
pub struct QueryEngine {
    session: StoreSession,
    schema: SchemaManager,
    embedding_timeout: Duration,
}

impl QueryEngine {
    pub fn new(session: StoreSession) -> Self {
        Self {
            schema: SchemaManager::new(session.clone()),
            session,
            embedding_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_embedding_timeout(mut self, timeout: Duration) -> Self {
        self.embedding_timeout = timeout;
        self
    }

    /// Texts of the closest chunks, most similar first.
    pub async fn query(&self, request: &QueryVectorRequest) -> AppResult<Vec<String>> {
        Ok(self
            .query_matches(request)
            .await?
            .into_iter()
            .map(|m| m.text)
            .collect())
    }

    /// Closest chunks with their store-reported scores.
    ///
    /// A failing store search yields an empty result; embedding and
    /// configuration failures are returned.
    pub async fn query_matches(&self, request: &QueryVectorRequest) -> AppResult<Vec<QueryMatch>> {
        request.validate()?;

        let model = EmbeddingModel::resolve(
            &request.embedding_model_name,
            request.api_key.as_ref(),
            request.base_url.as_deref(),
        )?;
        let provider = model.create_provider(self.embedding_timeout)?;

        self.query_with_provider(request, provider.as_ref()).await
    }

    #[instrument(
        skip(self, request, provider),
        fields(kid = %request.kid, limit = request.max_results)
    )]
    pub async fn query_with_provider(
        &self,
        request: &QueryVectorRequest,
        provider: &dyn EmbeddingProvider,
    ) -> AppResult<Vec<QueryMatch>> {
        request.validate()?;
        let class_name = self.session.class_name(&request.kid)?;

        if let SchemaStatus::Unverified { reason } = self
            .schema
            .ensure_schema(&request.kid, &request.model_name)
            .await?
        {
            warn!(
                "Schema for knowledge base '{}' could not be verified: {}",
                request.kid, reason
            );
        }

        let start = Instant::now();
        let vector = provider.embed(&request.query).await?;

        let mut matches = match self
            .session
            .store()
            .near_vector(&class_name, &vector, request.max_results)
            .await
        {
            Ok(matches) => matches,
            Err(e) => {
                error!("Query on '{}' failed: {}", class_name, e);
                return Ok(Vec::new());
            }
        };
        matches.truncate(request.max_results);

        info!(
            "Query on '{}' returned {} matches in {:.2}s",
            class_name,
            matches.len(),
            start.elapsed().as_secs_f64()
        );

        for (rank, m) in matches.iter().enumerate() {
            info!(
                "#{} similarity={} distance={} docId={} fid={} preview={:?}",
                rank + 1,
                m.similarity_percent().as_deref().unwrap_or("n/a"),
                m.distance
                    .map(|d| format!("{:.4}", d))
                    .unwrap_or_else(|| "n/a".to_string()),
                m.doc_id,
                m.fid,
                m.preview()
            );
        }

        Ok(matches)
    }
}
