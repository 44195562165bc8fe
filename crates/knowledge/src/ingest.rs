//! Chunk ingestion: embed each chunk and write it as a record.
//!
//! Records are written one store call per chunk, on a bounded number of
//! concurrent tasks. The first failing chunk aborts the remaining writes;
//! records already written stay in place. Record ids are derived from
//! `(kid, docId, fid)`, so re-running the same request overwrites them
//! instead of adding duplicates.

use crate::embeddings::{EmbeddingModel, EmbeddingProvider};
use crate::schema::SchemaManager;
use crate::session::StoreSession;
use crate::types::{IngestStats, Record, RecordProperties, SchemaStatus, StoreEmbeddingRequest};
use futures::stream::{self, TryStreamExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument, warn};
use vecbase_core::config::{DEFAULT_INGEST_CONCURRENCY, DEFAULT_TIMEOUT_SECS};
use vecbase_core::{AppError, AppResult};

#[derive(Debug, Clone)]
pub struct IngestionPipeline {
    session: StoreSession,
    schema: SchemaManager,
    concurrency: usize,
    embedding_timeout: Duration,
}

impl IngestionPipeline {
    pub fn new(session: StoreSession) -> Self {
        Self {
            schema: SchemaManager::new(session.clone()),
            session,
            concurrency: DEFAULT_INGEST_CONCURRENCY,
            embedding_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Maximum number of chunks embedded and written at the same time.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_embedding_timeout(mut self, timeout: Duration) -> Self {
        self.embedding_timeout = timeout;
        self
    }

    /// Embed and store every chunk of the request.
    ///
    /// The embedding model is resolved first, so an unknown model or a
    /// missing credential fails before the schema is touched.
    ///
    /// # Errors
    /// * `AppError::InvalidRequest` - Chunk and fragment id counts differ, or the kid is invalid
    /// * `AppError::UnsupportedModel` / `AppError::Config` - The model cannot be resolved
    /// * `AppError::Write` - A chunk could not be embedded or written
    pub async fn store(&self, request: &StoreEmbeddingRequest) -> AppResult<IngestStats> {
        request.validate()?;

        let model = EmbeddingModel::resolve(
            &request.embedding_model_name,
            request.api_key.as_ref(),
            request.base_url.as_deref(),
        )?;
        let provider = model.create_provider(self.embedding_timeout)?;

        self.store_with_provider(request, provider.as_ref()).await
    }

    /// Same as [`store`](Self::store) with an already constructed provider.
    #[instrument(
        skip(self, request, provider),
        fields(kid = %request.kid, doc_id = %request.doc_id, chunks = request.chunks.len())
    )]
    pub async fn store_with_provider(
        &self,
        request: &StoreEmbeddingRequest,
        provider: &dyn EmbeddingProvider,
    ) -> AppResult<IngestStats> {
        request.validate()?;
        let class_name = self.session.class_name(&request.kid)?;

        if let SchemaStatus::Unverified { reason } = self
            .schema
            .ensure_schema(&request.kid, &request.model_name)
            .await?
        {
            warn!(
                "Schema for knowledge base '{}' could not be verified, writing anyway: {}",
                request.kid, reason
            );
        }

        let start = Instant::now();
        info!(
            "Storing {} chunks of document '{}' into '{}' with model '{}'",
            request.chunks.len(),
            request.doc_id,
            class_name,
            provider.model_name()
        );

        let written = AtomicUsize::new(0);
        let written_ref = &written;
        let class_name = class_name.as_str();

        let result = stream::iter(request.chunks.iter().zip(&request.fids).map(Ok::<_, AppError>))
            .try_for_each_concurrent(self.concurrency, |(text, fid)| async move {
                self.write_chunk(class_name, request, provider, text, fid)
                    .await?;
                written_ref.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .await;

        let records_written = written.load(Ordering::SeqCst);
        let duration = start.elapsed();

        if let Err(e) = result {
            error!(
                "Ingestion of document '{}' aborted after {} of {} records in {:.2}s: {}",
                request.doc_id,
                records_written,
                request.chunks.len(),
                duration.as_secs_f64(),
                e
            );
            return Err(e);
        }

        info!(
            "Stored {} records for document '{}' in {:.2}s",
            records_written,
            request.doc_id,
            duration.as_secs_f64()
        );

        Ok(IngestStats {
            records_written,
            duration_secs: duration.as_secs_f64(),
        })
    }

    async fn write_chunk(
        &self,
        class_name: &str,
        request: &StoreEmbeddingRequest,
        provider: &dyn EmbeddingProvider,
        text: &str,
        fid: &str,
    ) -> AppResult<()> {
        let vector = provider.embed(text).await.map_err(|e| {
            AppError::Write(format!("Failed to embed fragment '{}': {}", fid, e))
        })?;

        let record = Record::new(
            class_name,
            RecordProperties {
                text: text.to_string(),
                fid: fid.to_string(),
                kid: request.kid.clone(),
                doc_id: request.doc_id.clone(),
            },
            vector,
        );

        self.session
            .store()
            .put_object(&record)
            .await
            .map_err(|e| match e {
                AppError::Write(_) => e,
                other => AppError::Write(format!("Failed to write fragment '{}': {}", fid, other)),
            })?;

        debug!("Wrote fragment '{}' as {}", fid, record.id);
        Ok(())
    }
}
