//! Embedding models for knowledge base ingestion and query.
//!
//! A request names its model by id; [`EmbeddingModel::resolve`] maps the id to
//! a provider variant through a fixed table, and the variant builds the
//! [`EmbeddingProvider`] that turns text into vectors.

pub mod provider;
pub mod providers;
pub mod registry;

pub use provider::{validate_embedding, EmbeddingProvider};
pub use registry::{EmbeddingModel, ModelSpec, ProviderKind, SUPPORTED_MODELS};
