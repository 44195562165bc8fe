//! Knowledge index type definitions.

use serde::{Deserialize, Serialize};
use vecbase_core::{AppError, AppResult};

/// Property holding the chunk text.
pub const PROP_TEXT: &str = "text";
/// Property holding the fragment id.
pub const PROP_FID: &str = "fid";
/// Property holding the owning knowledge base id.
pub const PROP_KID: &str = "kid";
/// Property holding the owning document id.
pub const PROP_DOC_ID: &str = "docId";

/// Maximum characters of record text shown in query logs.
pub const PREVIEW_CHARS: usize = 150;

/// API key for hosted embedding providers. Never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The raw key, for building request headers.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Metadata stored alongside each vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordProperties {
    /// Chunk content
    pub text: String,

    /// Fragment id, unique within a document
    pub fid: String,

    /// Owning knowledge base
    pub kid: String,

    /// Owning document
    #[serde(rename = "docId")]
    pub doc_id: String,
}

impl RecordProperties {
    /// Value of a named property, as used by equality filters.
    pub fn get(&self, property: &str) -> Option<&str> {
        match property {
            PROP_TEXT => Some(&self.text),
            PROP_FID => Some(&self.fid),
            PROP_KID => Some(&self.kid),
            PROP_DOC_ID => Some(&self.doc_id),
            _ => None,
        }
    }
}

/// One embedded chunk as written to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Class (collection) the record belongs to
    pub class: String,

    /// Deterministic record id derived from (kid, docId, fid)
    pub id: String,

    pub properties: RecordProperties,

    pub vector: Vec<f32>,
}

impl Record {
    /// Build a record, deriving its id from the knowledge base, document and fragment.
    pub fn new(class: impl Into<String>, properties: RecordProperties, vector: Vec<f32>) -> Self {
        let id = record_id(&properties.kid, &properties.doc_id, &properties.fid);
        Self {
            class: class.into(),
            id,
            properties,
            vector,
        }
    }
}

/// Stable id for a fragment so that re-ingesting it overwrites the previous copy.
pub fn record_id(kid: &str, doc_id: &str, fid: &str) -> String {
    let name = format!("{}\u{1f}{}\u{1f}{}", kid, doc_id, fid);
    uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_OID, name.as_bytes()).to_string()
}

/// One nearest-neighbour match returned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryMatch {
    pub text: String,
    pub fid: String,
    pub kid: String,

    #[serde(rename = "docId")]
    pub doc_id: String,

    /// Store-reported distance, lower is more similar
    pub distance: Option<f64>,

    /// Store-reported certainty in 0..=1, higher is more similar
    pub certainty: Option<f64>,

    /// Store object id
    pub id: Option<String>,
}

impl QueryMatch {
    /// Certainty as a percentage string, e.g. `"87.50%"`.
    pub fn similarity_percent(&self) -> Option<String> {
        self.certainty.map(|c| format!("{:.2}%", c * 100.0))
    }

    /// Text truncated to [`PREVIEW_CHARS`] characters for logging.
    pub fn preview(&self) -> String {
        preview(&self.text, PREVIEW_CHARS)
    }
}

/// Truncate `text` to at most `max_chars` characters, appending `...` when cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Counts reported by a filtered batch delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteSummary {
    pub matches: u64,
    pub successful: u64,
    pub failed: u64,
}

/// Outcome of ensuring a knowledge base's class exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaStatus {
    /// The class was already present; nothing was written
    Existing,
    /// The class was created by this call
    Created,
    /// Listing or creation failed; later operations may fail too
    Unverified { reason: String },
}

/// Statistics for a completed ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestStats {
    pub records_written: usize,
    pub duration_secs: f64,
}

/// Request to embed and store the chunks of one document.
#[derive(Debug, Clone)]
pub struct StoreEmbeddingRequest {
    /// Knowledge base id
    pub kid: String,

    /// Document the chunks belong to
    pub doc_id: String,

    /// Vector model name recorded with the schema request
    pub model_name: String,

    /// Embedding model id, resolved through the model table
    pub embedding_model_name: String,

    /// Credential for hosted embedding providers
    pub api_key: Option<ApiKey>,

    /// Provider endpoint
    pub base_url: Option<String>,

    /// Chunk texts; `chunks[i]` belongs to `fids[i]`
    pub chunks: Vec<String>,

    /// Fragment ids, positionally matching `chunks`
    pub fids: Vec<String>,
}

impl StoreEmbeddingRequest {
    pub fn new(
        kid: impl Into<String>,
        doc_id: impl Into<String>,
        embedding_model_name: impl Into<String>,
    ) -> Self {
        Self {
            kid: kid.into(),
            doc_id: doc_id.into(),
            model_name: String::new(),
            embedding_model_name: embedding_model_name.into(),
            api_key: None,
            base_url: None,
            chunks: Vec::new(),
            fids: Vec::new(),
        }
    }

    pub fn with_chunks(mut self, chunks: Vec<String>, fids: Vec<String>) -> Self {
        self.chunks = chunks;
        self.fids = fids;
        self
    }

    pub fn with_model_name(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = model_name.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(ApiKey::new(api_key));
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Check the positional correspondence between chunks and fragment ids.
    pub fn validate(&self) -> AppResult<()> {
        if self.chunks.len() != self.fids.len() {
            return Err(AppError::InvalidRequest(format!(
                "{} chunks but {} fragment ids for document '{}'",
                self.chunks.len(),
                self.fids.len(),
                self.doc_id
            )));
        }
        Ok(())
    }
}

/// Request for the nearest chunks to a query text.
#[derive(Debug, Clone)]
pub struct QueryVectorRequest {
    pub kid: String,
    pub query: String,
    pub model_name: String,
    pub embedding_model_name: String,
    pub api_key: Option<ApiKey>,
    pub base_url: Option<String>,

    /// Upper bound on returned matches, at least 1
    pub max_results: usize,
}

impl QueryVectorRequest {
    pub fn new(
        kid: impl Into<String>,
        query: impl Into<String>,
        embedding_model_name: impl Into<String>,
        max_results: usize,
    ) -> Self {
        Self {
            kid: kid.into(),
            query: query.into(),
            model_name: String::new(),
            embedding_model_name: embedding_model_name.into(),
            api_key: None,
            base_url: None,
            max_results,
        }
    }

    pub fn with_model_name(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = model_name.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(ApiKey::new(api_key));
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.max_results == 0 {
            return Err(AppError::InvalidRequest(
                "max_results must be a positive integer".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(fid: &str) -> RecordProperties {
        RecordProperties {
            text: "hello".to_string(),
            fid: fid.to_string(),
            kid: "42".to_string(),
            doc_id: "doc-1".to_string(),
        }
    }

    #[test]
    fn test_record_id_is_stable_per_fragment() {
        let a = Record::new("LocalKnowledge42", props("f1"), vec![1.0]);
        let b = Record::new("LocalKnowledge42", props("f1"), vec![0.5]);
        let c = Record::new("LocalKnowledge42", props("f2"), vec![1.0]);

        assert_eq!(a.id, b.id);
        assert_ne!(a.id, c.id);
        assert!(uuid::Uuid::parse_str(&a.id).is_ok());
    }

    #[test]
    fn test_properties_serialize_with_doc_id_casing() {
        let json = serde_json::to_value(props("f1")).unwrap();
        assert_eq!(json["docId"], "doc-1");
        assert!(json.get("doc_id").is_none());
    }

    #[test]
    fn test_property_lookup() {
        let p = props("f9");
        assert_eq!(p.get(PROP_FID), Some("f9"));
        assert_eq!(p.get(PROP_DOC_ID), Some("doc-1"));
        assert_eq!(p.get("missing"), None);
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        let text = "é".repeat(200);
        let short = preview(&text, PREVIEW_CHARS);
        assert_eq!(short.chars().count(), PREVIEW_CHARS + 3);
        assert!(short.ends_with("..."));

        assert_eq!(preview("short", PREVIEW_CHARS), "short");
    }

    #[test]
    fn test_similarity_percent() {
        let m = QueryMatch {
            text: String::new(),
            fid: String::new(),
            kid: String::new(),
            doc_id: String::new(),
            distance: Some(0.25),
            certainty: Some(0.875),
            id: None,
        };
        assert_eq!(m.similarity_percent(), Some("87.50%".to_string()));
    }

    #[test]
    fn test_store_request_validation() {
        let ok = StoreEmbeddingRequest::new("1", "d", "trigram-v1")
            .with_chunks(vec!["a".into()], vec!["f1".into()]);
        assert!(ok.validate().is_ok());

        let bad = StoreEmbeddingRequest::new("1", "d", "trigram-v1")
            .with_chunks(vec!["a".into(), "b".into()], vec!["f1".into()]);
        assert!(matches!(bad.validate(), Err(AppError::InvalidRequest(_))));
    }

    #[test]
    fn test_api_key_debug_is_redacted() {
        let request = QueryVectorRequest::new("1", "q", "baai/bge-m3", 3).with_api_key("sk-secret");
        let debug = format!("{:?}", request);
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("ApiKey(***)"));
    }

    #[test]
    fn test_query_request_requires_positive_limit() {
        let request = QueryVectorRequest::new("1", "q", "trigram-v1", 0);
        assert!(request.validate().is_err());
    }
}
