//! Test doubles shared by the knowledge crate's unit tests.

use crate::embeddings::EmbeddingProvider;
use crate::store::{ClassDefinition, InMemoryVectorStore, VectorStore, WhereFilter};
use crate::types::{DeleteSummary, QueryMatch, Record, RecordProperties};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use vecbase_core::{AppError, AppResult};

/// Provider that returns a fixed vector per known text and a zero vector otherwise.
#[derive(Debug)]
pub struct FixedProvider {
    dimensions: usize,
    vectors: HashMap<String, Vec<f32>>,
}

impl FixedProvider {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            vectors: HashMap::new(),
        }
    }

    pub fn with(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.to_string(), vector);
        self
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for FixedProvider {
    fn provider_name(&self) -> &str {
        "fixed"
    }

    fn model_name(&self) -> &str {
        "fixed"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|t| {
                self.vectors
                    .get(t)
                    .cloned()
                    .unwrap_or_else(|| vec![0.0; self.dimensions])
            })
            .collect())
    }
}

/// Provider whose every call fails.
#[derive(Debug)]
pub struct FailingProvider;

#[async_trait::async_trait]
impl EmbeddingProvider for FailingProvider {
    fn provider_name(&self) -> &str {
        "failing"
    }

    fn model_name(&self) -> &str {
        "failing"
    }

    fn dimensions(&self) -> usize {
        2
    }

    async fn embed_batch(&self, _texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Err(AppError::Embedding("provider unavailable".to_string()))
    }
}

/// Store operations that [`FaultyStore`] can be told to fail.
#[derive(Debug, Clone, Copy)]
pub enum Fault {
    List,
    Create,
    /// Fail every write after this many succeeded
    PutAfter(usize),
    Query,
    Delete,
    DropClass,
}

/// In-memory store with injectable failures.
#[derive(Debug)]
pub struct FaultyStore {
    inner: InMemoryVectorStore,
    fail_list: AtomicBool,
    fail_create: AtomicBool,
    put_budget: AtomicUsize,
    fail_query: AtomicBool,
    fail_delete: AtomicBool,
    fail_drop: AtomicBool,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self {
            inner: InMemoryVectorStore::new(),
            fail_list: AtomicBool::new(false),
            fail_create: AtomicBool::new(false),
            put_budget: AtomicUsize::new(usize::MAX),
            fail_query: AtomicBool::new(false),
            fail_delete: AtomicBool::new(false),
            fail_drop: AtomicBool::new(false),
        }
    }

    pub fn inject(&self, fault: Fault) {
        match fault {
            Fault::List => self.fail_list.store(true, Ordering::SeqCst),
            Fault::Create => self.fail_create.store(true, Ordering::SeqCst),
            Fault::PutAfter(n) => self.put_budget.store(n, Ordering::SeqCst),
            Fault::Query => self.fail_query.store(true, Ordering::SeqCst),
            Fault::Delete => self.fail_delete.store(true, Ordering::SeqCst),
            Fault::DropClass => self.fail_drop.store(true, Ordering::SeqCst),
        }
    }

    pub fn inner(&self) -> &InMemoryVectorStore {
        &self.inner
    }
}

#[async_trait::async_trait]
impl VectorStore for FaultyStore {
    fn backend_name(&self) -> &str {
        "faulty"
    }

    async fn list_classes(&self) -> AppResult<Vec<String>> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(AppError::Connection("connection refused".to_string()));
        }
        self.inner.list_classes().await
    }

    async fn create_class(&self, class: &ClassDefinition) -> AppResult<()> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(AppError::Schema("status 500".to_string()));
        }
        self.inner.create_class(class).await
    }

    async fn delete_class(&self, class_name: &str) -> AppResult<()> {
        if self.fail_drop.load(Ordering::SeqCst) {
            return Err(AppError::Connection("connection reset".to_string()));
        }
        self.inner.delete_class(class_name).await
    }

    async fn put_object(&self, record: &Record) -> AppResult<()> {
        let allowed = self
            .put_budget
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if !allowed {
            return Err(AppError::Write("store rejected object".to_string()));
        }
        self.inner.put_object(record).await
    }

    async fn near_vector(
        &self,
        class_name: &str,
        vector: &[f32],
        limit: usize,
    ) -> AppResult<Vec<QueryMatch>> {
        if self.fail_query.load(Ordering::SeqCst) {
            return Err(AppError::Query("graphql error".to_string()));
        }
        self.inner.near_vector(class_name, vector, limit).await
    }

    async fn delete_where(
        &self,
        class_name: &str,
        filter: &WhereFilter,
    ) -> AppResult<DeleteSummary> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(AppError::Deletion("status 500".to_string()));
        }
        self.inner.delete_where(class_name, filter).await
    }
}

/// Write a record with the given text and vector into an existing class.
pub async fn put(store: &dyn VectorStore, class: &str, text: &str, fid: &str, vector: Vec<f32>) {
    let record = Record::new(
        class,
        RecordProperties {
            text: text.to_string(),
            fid: fid.to_string(),
            kid: "1".to_string(),
            doc_id: "doc".to_string(),
        },
        vector,
    );
    store.put_object(&record).await.unwrap();
}

/// Write a record identified by document and fragment with a dummy vector.
pub async fn put_record(
    store: &dyn VectorStore,
    class: &str,
    kid: &str,
    doc_id: &str,
    fid: &str,
) {
    let record = Record::new(
        class,
        RecordProperties {
            text: format!("{}/{}", doc_id, fid),
            fid: fid.to_string(),
            kid: kid.to_string(),
            doc_id: doc_id.to_string(),
        },
        vec![1.0, 0.0],
    );
    store.put_object(&record).await.unwrap();
}
