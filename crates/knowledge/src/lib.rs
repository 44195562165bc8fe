//! Per-knowledge-base vector index management.
//!
//! Each knowledge base (`kid`) owns one class `<prefix><kid>` in a Weaviate
//! compatible store. Chunks are embedded with a model picked from a fixed
//! table, written as records carrying `text`, `fid`, `kid` and `docId`, and
//! retrieved by nearest-vector search. Records can be removed per knowledge
//! base, per document or per fragment.

pub mod deletion;
pub mod embeddings;
pub mod ingest;
pub mod query;
pub mod schema;
pub mod service;
pub mod session;
pub mod store;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use deletion::DeletionService;
pub use embeddings::{EmbeddingModel, EmbeddingProvider};
pub use ingest::IngestionPipeline;
pub use query::QueryEngine;
pub use schema::SchemaManager;
pub use service::{ServiceOptions, VectorStoreService};
pub use session::StoreSession;
pub use store::{InMemoryVectorStore, VectorStore, WeaviateClient};
pub use types::{
    ApiKey, DeleteSummary, IngestStats, QueryMatch, QueryVectorRequest, Record, SchemaStatus,
    StoreEmbeddingRequest,
};
