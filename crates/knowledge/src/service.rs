//! The public operation surface of the index manager.

use crate::deletion::DeletionService;
use crate::ingest::IngestionPipeline;
use crate::query::QueryEngine;
use crate::schema::SchemaManager;
use crate::session::StoreSession;
use crate::types::{
    DeleteSummary, IngestStats, QueryMatch, QueryVectorRequest, SchemaStatus,
    StoreEmbeddingRequest,
};
use std::time::Duration;
use vecbase_core::config::{DEFAULT_INGEST_CONCURRENCY, DEFAULT_TIMEOUT_SECS};
use vecbase_core::{AppConfig, AppResult};

/// Tunables read from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceOptions {
    pub ingest_concurrency: usize,
    pub store_timeout: Duration,
    pub embedding_timeout: Duration,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            ingest_concurrency: DEFAULT_INGEST_CONCURRENCY,
            store_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            embedding_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ServiceOptions {
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        Ok(Self {
            ingest_concurrency: config.ingest_concurrency()?,
            store_timeout: Duration::from_secs(config.timeout_secs("weaviate")?),
            embedding_timeout: Duration::from_secs(config.timeout_secs("embedding")?),
        })
    }
}

/// Schema provisioning, ingestion, query and deletion over one store session.
#[derive(Debug, Clone)]
pub struct VectorStoreService {
    session: StoreSession,
    schema: SchemaManager,
    ingestion: IngestionPipeline,
    query: QueryEngine,
    deletion: DeletionService,
}

impl VectorStoreService {
    pub fn new(session: StoreSession, options: ServiceOptions) -> Self {
        Self {
            schema: SchemaManager::new(session.clone()),
            ingestion: IngestionPipeline::new(session.clone())
                .with_concurrency(options.ingest_concurrency)
                .with_embedding_timeout(options.embedding_timeout),
            query: QueryEngine::new(session.clone())
                .with_embedding_timeout(options.embedding_timeout),
            deletion: DeletionService::new(session.clone()),
            session,
        }
    }

    /// Connect to the Weaviate instance named in `config`.
    pub fn connect(config: &AppConfig) -> AppResult<Self> {
        let options = ServiceOptions::from_config(config)?;
        let session = StoreSession::connect(config, options.store_timeout)?;
        Ok(Self::new(session, options))
    }

    pub fn session(&self) -> &StoreSession {
        &self.session
    }

    pub async fn ensure_schema(&self, kid: &str, model_name: &str) -> AppResult<SchemaStatus> {
        self.schema.ensure_schema(kid, model_name).await
    }

    pub async fn store_embeddings(
        &self,
        request: &StoreEmbeddingRequest,
    ) -> AppResult<IngestStats> {
        self.ingestion.store(request).await
    }

    pub async fn query(&self, request: &QueryVectorRequest) -> AppResult<Vec<String>> {
        self.query.query(request).await
    }

    pub async fn query_matches(&self, request: &QueryVectorRequest) -> AppResult<Vec<QueryMatch>> {
        self.query.query_matches(request).await
    }

    pub async fn remove_knowledge_base(&self, kid: &str) -> AppResult<()> {
        self.deletion.remove_knowledge_base(kid).await
    }

    pub async fn remove_by_document(
        &self,
        kid: &str,
        doc_id: &str,
    ) -> AppResult<Option<DeleteSummary>> {
        self.deletion.remove_by_document(kid, doc_id).await
    }

    pub async fn remove_by_fragment(
        &self,
        kid: &str,
        fid: &str,
    ) -> AppResult<Option<DeleteSummary>> {
        self.deletion.remove_by_fragment(kid, fid).await
    }
}
