//! Vector store abstraction for knowledge base classes.
//!
//! Defines the operations the index manager needs from a similarity-searchable
//! store: schema listing and creation, record writes, nearest-vector search and
//! equality-filtered batch deletion. [`WeaviateClient`] speaks the Weaviate REST
//! and GraphQL API; [`InMemoryVectorStore`] keeps everything in process.

pub mod memory;
pub mod weaviate;

pub use memory::InMemoryVectorStore;
pub use weaviate::WeaviateClient;

use crate::types::{
    DeleteSummary, QueryMatch, Record, RecordProperties, PROP_DOC_ID, PROP_FID, PROP_KID,
    PROP_TEXT,
};
use serde::{Deserialize, Serialize};
use vecbase_core::AppResult;

/// Schema definition of one class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDefinition {
    /// Class name, `<prefix><kid>`
    pub class: String,

    /// Always `"none"`: vectors are supplied by the caller
    pub vectorizer: String,

    pub properties: Vec<PropertyDefinition>,
}

/// One property of a class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDefinition {
    pub name: String,

    #[serde(rename = "dataType")]
    pub data_type: Vec<String>,
}

impl PropertyDefinition {
    fn text(name: &str) -> Self {
        Self {
            name: name.to_string(),
            data_type: vec!["text".to_string()],
        }
    }
}

impl ClassDefinition {
    /// The fixed class layout every knowledge base uses.
    pub fn knowledge_base(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            vectorizer: "none".to_string(),
            properties: [PROP_TEXT, PROP_FID, PROP_KID, PROP_DOC_ID]
                .into_iter()
                .map(PropertyDefinition::text)
                .collect(),
        }
    }
}

/// Equality filter on a single text property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhereFilter {
    pub path: Vec<String>,
    pub operator: String,

    #[serde(rename = "valueText")]
    pub value_text: String,
}

impl WhereFilter {
    /// `property == value`
    pub fn equal(property: &str, value: impl Into<String>) -> Self {
        Self {
            path: vec![property.to_string()],
            operator: "Equal".to_string(),
            value_text: value.into(),
        }
    }

    /// Property the filter applies to.
    pub fn property(&self) -> &str {
        self.path.first().map(String::as_str).unwrap_or_default()
    }

    /// Whether a record's properties satisfy the filter.
    pub fn matches(&self, properties: &RecordProperties) -> bool {
        properties.get(self.property()) == Some(self.value_text.as_str())
    }
}

/// Trait for vector store backends.
///
/// Implementations must support:
/// - Listing, creating and deleting classes
/// - Writing a record with its vector (upsert by record id)
/// - Nearest-vector search ordered nearest first
/// - Batch deletion by an equality filter
#[async_trait::async_trait]
pub trait VectorStore: Send + Sync + std::fmt::Debug {
    /// Backend name used in logs (e.g., "weaviate", "memory")
    fn backend_name(&self) -> &str;

    /// Names of all classes currently defined.
    async fn list_classes(&self) -> AppResult<Vec<String>>;

    /// Create a class.
    async fn create_class(&self, class: &ClassDefinition) -> AppResult<()>;

    /// Drop a class and all its records. Dropping a missing class succeeds.
    async fn delete_class(&self, class_name: &str) -> AppResult<()>;

    /// Write one record.
    async fn put_object(&self, record: &Record) -> AppResult<()>;

    /// Up to `limit` records closest to `vector`, nearest first.
    async fn near_vector(
        &self,
        class_name: &str,
        vector: &[f32],
        limit: usize,
    ) -> AppResult<Vec<QueryMatch>>;

    /// Delete every record of `class_name` matching `filter`.
    async fn delete_where(&self, class_name: &str, filter: &WhereFilter)
        -> AppResult<DeleteSummary>;
}
