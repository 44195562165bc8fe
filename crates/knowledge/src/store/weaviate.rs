//! Weaviate-backed vector store.
//!
//! Talks to the Weaviate REST API for schema, object and batch operations and
//! to its GraphQL endpoint for `nearVector` search.
//! API reference: https://weaviate.io/developers/weaviate/api/rest

use super::{ClassDefinition, VectorStore, WhereFilter};
use crate::types::{DeleteSummary, QueryMatch, Record};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};
use vecbase_core::{AppError, AppResult};

const SCHEMA_ENDPOINT: &str = "/v1/schema";
const BATCH_OBJECTS_ENDPOINT: &str = "/v1/batch/objects";
const GRAPHQL_ENDPOINT: &str = "/v1/graphql";

/// HTTP client for a Weaviate instance.
#[derive(Debug, Clone)]
pub struct WeaviateClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct SchemaResponse {
    #[serde(default)]
    classes: Option<Vec<ClassSummary>>,
}

#[derive(Debug, Deserialize)]
struct ClassSummary {
    class: String,
}

#[derive(Debug, Deserialize)]
struct BatchObjectResponse {
    #[serde(default)]
    result: Option<BatchObjectResult>,
}

#[derive(Debug, Deserialize)]
struct BatchObjectResult {
    #[serde(default)]
    errors: Option<BatchErrors>,
}

#[derive(Debug, Deserialize)]
struct BatchErrors {
    #[serde(default)]
    error: Vec<ErrorMessage>,
}

#[derive(Debug, Deserialize)]
struct ErrorMessage {
    message: String,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<serde_json::Value>,
    #[serde(default)]
    errors: Option<Vec<ErrorMessage>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlHit {
    #[serde(default)]
    text: String,
    #[serde(default)]
    fid: String,
    #[serde(default)]
    kid: String,
    #[serde(rename = "docId", default)]
    doc_id: String,
    #[serde(rename = "_additional", default)]
    additional: Option<Additional>,
}

#[derive(Debug, Deserialize)]
struct Additional {
    distance: Option<f64>,
    certainty: Option<f64>,
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BatchDeleteResponse {
    results: Option<BatchDeleteResults>,
}

#[derive(Debug, Deserialize)]
struct BatchDeleteResults {
    #[serde(default)]
    matches: u64,
    #[serde(default)]
    successful: u64,
    #[serde(default)]
    failed: u64,
}

impl WeaviateClient {
    /// Create a client from the configured protocol and host (e.g. `http`, `localhost:8080`).
    pub fn new(protocol: &str, host: &str, timeout: Duration) -> AppResult<Self> {
        let protocol = protocol.trim().trim_end_matches("://");
        let host = host.trim().trim_end_matches('/');
        if protocol.is_empty() || host.is_empty() {
            return Err(AppError::Config(
                "Weaviate protocol and host must not be empty".to_string(),
            ));
        }
        Self::with_base_url(format!("{}://{}", protocol, host), timeout)
    }

    /// Create a client for a full base URL.
    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            AppError::Connection(format!("Failed to create HTTP client for Weaviate: {}", e))
        })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    fn connection_error(&self, e: reqwest::Error) -> AppError {
        AppError::Connection(format!("Weaviate at {} unreachable: {}", self.base_url, e))
    }
}

/// Render the GraphQL `nearVector` query for a class.
pub fn near_vector_query(class_name: &str, vector: &[f32], limit: usize) -> String {
    let vector = vector
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",");

    format!(
        concat!(
            "{{\n  Get {{\n    {}(nearVector: {{vector: [{}]}} limit: {}) {{\n",
            "      text\n      fid\n      kid\n      docId\n",
            "      _additional {{\n        distance\n        certainty\n        id\n      }}\n",
            "    }}\n  }}\n}}"
        ),
        class_name, vector, limit
    )
}

/// Read an error body as text for diagnostics.
async fn error_body(response: Response) -> String {
    response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string())
}

#[async_trait::async_trait]
impl VectorStore for WeaviateClient {
    fn backend_name(&self) -> &str {
        "weaviate"
    }

    #[instrument(skip(self))]
    async fn list_classes(&self) -> AppResult<Vec<String>> {
        let response = self
            .client
            .get(self.url(SCHEMA_ENDPOINT))
            .send()
            .await
            .map_err(|e| self.connection_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Schema(format!(
                "Schema listing failed ({}): {}",
                status,
                error_body(response).await
            )));
        }

        let schema: SchemaResponse = response
            .json()
            .await
            .map_err(|e| AppError::Schema(format!("Failed to parse schema listing: {}", e)))?;

        Ok(schema
            .classes
            .unwrap_or_default()
            .into_iter()
            .map(|c| c.class)
            .collect())
    }

    #[instrument(skip(self, class), fields(class = %class.class))]
    async fn create_class(&self, class: &ClassDefinition) -> AppResult<()> {
        let response = self
            .client
            .post(self.url(SCHEMA_ENDPOINT))
            .json(class)
            .send()
            .await
            .map_err(|e| self.connection_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Schema(format!(
                "Class creation for '{}' failed ({}): {}",
                class.class,
                status,
                error_body(response).await
            )));
        }

        debug!("Created class '{}'", class.class);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_class(&self, class_name: &str) -> AppResult<()> {
        let response = self
            .client
            .delete(self.url(&format!("{}/{}", SCHEMA_ENDPOINT, class_name)))
            .send()
            .await
            .map_err(|e| AppError::Deletion(format!("Weaviate unreachable: {}", e)))?;

        let status = response.status();
        if status.is_success() || status == StatusCode::NOT_FOUND {
            return Ok(());
        }

        Err(AppError::Deletion(format!(
            "Deleting class '{}' failed ({}): {}",
            class_name,
            status,
            error_body(response).await
        )))
    }

    #[instrument(
        skip(self, record),
        fields(class = %record.class, id = %record.id, dims = record.vector.len())
    )]
    async fn put_object(&self, record: &Record) -> AppResult<()> {
        let body = serde_json::json!({ "objects": [record] });

        let response = self
            .client
            .post(self.url(BATCH_OBJECTS_ENDPOINT))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.connection_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Write(format!(
                "Object write to '{}' failed ({}): {}",
                record.class,
                status,
                error_body(response).await
            )));
        }

        // Per-object errors come back inside a 200 response
        let results: Vec<BatchObjectResponse> = response
            .json()
            .await
            .map_err(|e| AppError::Write(format!("Failed to parse batch response: {}", e)))?;

        let messages: Vec<String> = results
            .into_iter()
            .filter_map(|r| r.result)
            .filter_map(|r| r.errors)
            .flat_map(|e| e.error)
            .map(|e| e.message)
            .collect();

        if !messages.is_empty() {
            return Err(AppError::Write(format!(
                "Object write to '{}' rejected: {}",
                record.class,
                messages.join("; ")
            )));
        }

        Ok(())
    }

    #[instrument(skip(self, vector), fields(dims = vector.len()))]
    async fn near_vector(
        &self,
        class_name: &str,
        vector: &[f32],
        limit: usize,
    ) -> AppResult<Vec<QueryMatch>> {
        let query = near_vector_query(class_name, vector, limit);

        let response = self
            .client
            .post(self.url(GRAPHQL_ENDPOINT))
            .json(&serde_json::json!({ "query": query }))
            .send()
            .await
            .map_err(|e| self.connection_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Query(format!(
                "GraphQL request failed ({}): {}",
                status,
                error_body(response).await
            )));
        }

        let body: GraphQlResponse = response
            .json()
            .await
            .map_err(|e| AppError::Query(format!("Failed to parse GraphQL response: {}", e)))?;

        if let Some(errors) = body.errors.filter(|e| !e.is_empty()) {
            let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
            return Err(AppError::Query(format!(
                "GraphQL query failed: {}",
                messages.join("; ")
            )));
        }

        let hits = body
            .data
            .as_ref()
            .and_then(|data| data.get("Get"))
            .and_then(|get| get.get(class_name))
            .cloned()
            .unwrap_or(serde_json::Value::Null);

        if hits.is_null() {
            return Ok(Vec::new());
        }

        let hits: Vec<GraphQlHit> = serde_json::from_value(hits)
            .map_err(|e| AppError::Query(format!("Unexpected GraphQL result shape: {}", e)))?;

        Ok(hits
            .into_iter()
            .map(|hit| {
                let (distance, certainty, id) = match hit.additional {
                    Some(a) => (a.distance, a.certainty, a.id),
                    None => (None, None, None),
                };
                QueryMatch {
                    text: hit.text,
                    fid: hit.fid,
                    kid: hit.kid,
                    doc_id: hit.doc_id,
                    distance,
                    certainty,
                    id,
                }
            })
            .collect())
    }

    #[instrument(skip(self, filter), fields(property = filter.property()))]
    async fn delete_where(
        &self,
        class_name: &str,
        filter: &WhereFilter,
    ) -> AppResult<DeleteSummary> {
        let body = serde_json::json!({
            "match": {
                "class": class_name,
                "where": filter,
            },
            "output": "minimal",
        });

        let response = self
            .client
            .delete(self.url(BATCH_OBJECTS_ENDPOINT))
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Deletion(format!("Weaviate unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Deletion(format!(
                "Batch delete on '{}' failed ({}): {}",
                class_name,
                status,
                error_body(response).await
            )));
        }

        let body: BatchDeleteResponse = response.json().await.map_err(|e| {
            AppError::Deletion(format!("Failed to parse batch delete response: {}", e))
        })?;

        Ok(body
            .results
            .map(|r| DeleteSummary {
                matches: r.matches,
                successful: r.successful,
                failed: r.failed,
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RecordProperties, PROP_FID};
    use serde_json::json;
    use wiremock::matchers::{body_json, body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> WeaviateClient {
        WeaviateClient::with_base_url(server.uri(), Duration::from_secs(5)).unwrap()
    }

    fn sample_record() -> Record {
        Record::new(
            "LocalKnowledge1",
            RecordProperties {
                text: "hello".to_string(),
                fid: "f1".to_string(),
                kid: "1".to_string(),
                doc_id: "d1".to_string(),
            },
            vec![0.5, 0.25],
        )
    }

    #[test]
    fn test_new_builds_base_url() {
        let client =
            WeaviateClient::new("http", "localhost:8080/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080");

        assert!(WeaviateClient::new("", "localhost", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_near_vector_query_shape() {
        let query = near_vector_query("LocalKnowledge1", &[0.5, -1.0], 3);
        assert!(query.contains("LocalKnowledge1(nearVector: {vector: [0.5,-1]} limit: 3)"));
        assert!(query.contains("_additional"));
        assert!(query.contains("certainty"));
        assert!(query.contains("docId"));
    }

    #[tokio::test]
    async fn test_list_classes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/schema"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "classes": [{"class": "LocalKnowledge1"}, {"class": "LocalKnowledge2"}]
            })))
            .mount(&server)
            .await;

        let classes = client_for(&server).list_classes().await.unwrap();
        assert_eq!(classes, vec!["LocalKnowledge1", "LocalKnowledge2"]);
    }

    #[tokio::test]
    async fn test_list_classes_empty_schema() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/schema"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"classes": null})))
            .mount(&server)
            .await;

        assert!(client_for(&server).list_classes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_class_sends_fixed_layout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/schema"))
            .and(body_partial_json(json!({
                "class": "LocalKnowledge1",
                "vectorizer": "none"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server)
            .create_class(&ClassDefinition::knowledge_base("LocalKnowledge1"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_create_class_failure_is_schema_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/schema"))
            .respond_with(ResponseTemplate::new(422).set_body_string("class name invalid"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .create_class(&ClassDefinition::knowledge_base("LocalKnowledge1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Schema(ref m) if m.contains("class name invalid")));
    }

    #[tokio::test]
    async fn test_put_object_posts_single_object_batch() {
        let server = MockServer::start().await;
        let record = sample_record();
        Mock::given(method("POST"))
            .and(path("/v1/batch/objects"))
            .and(body_partial_json(json!({
                "objects": [{
                    "class": "LocalKnowledge1",
                    "id": record.id,
                    "properties": {"text": "hello", "fid": "f1", "kid": "1", "docId": "d1"},
                    "vector": [0.5, 0.25]
                }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": record.id, "result": {}}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server).put_object(&record).await.unwrap();
    }

    #[tokio::test]
    async fn test_put_object_reports_per_object_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/batch/objects"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"result": {"errors": {"error": [{"message": "class not found"}]}}}
            ])))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .put_object(&sample_record())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Write(ref m) if m.contains("class not found")));
    }

    #[tokio::test]
    async fn test_near_vector_parses_hits_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/graphql"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"Get": {"LocalKnowledge1": [
                    {"text": "first", "fid": "f1", "kid": "1", "docId": "d1",
                     "_additional": {"distance": 0.1, "certainty": 0.95, "id": "a"}},
                    {"text": "second", "fid": "f2", "kid": "1", "docId": "d1",
                     "_additional": {"distance": 0.4, "certainty": 0.8, "id": "b"}}
                ]}}
            })))
            .mount(&server)
            .await;

        let hits = client_for(&server)
            .near_vector("LocalKnowledge1", &[1.0, 0.0], 5)
            .await
            .unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].text, "first");
        assert_eq!(hits[0].certainty, Some(0.95));
        assert_eq!(hits[1].doc_id, "d1");
        assert_eq!(hits[1].id.as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn test_near_vector_graphql_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/graphql"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"Get": {"LocalKnowledge1": null}},
                "errors": [{"message": "Cannot query field \"LocalKnowledge1\""}]
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .near_vector("LocalKnowledge1", &[1.0], 5)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Query(_)));
    }

    #[tokio::test]
    async fn test_near_vector_null_class_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/graphql"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"Get": {"LocalKnowledge1": []}}
            })))
            .mount(&server)
            .await;

        let hits = client_for(&server)
            .near_vector("LocalKnowledge1", &[1.0], 5)
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_delete_where_sends_filter() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v1/batch/objects"))
            .and(body_json(json!({
                "match": {
                    "class": "LocalKnowledge1",
                    "where": {"path": ["fid"], "operator": "Equal", "valueText": "f1"}
                },
                "output": "minimal"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": {"matches": 2, "successful": 2, "failed": 0, "limit": 10000}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let summary = client_for(&server)
            .delete_where("LocalKnowledge1", &WhereFilter::equal(PROP_FID, "f1"))
            .await
            .unwrap();
        assert_eq!(
            summary,
            DeleteSummary {
                matches: 2,
                successful: 2,
                failed: 0
            }
        );
    }

    #[tokio::test]
    async fn test_delete_class_missing_is_ok() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v1/schema/LocalKnowledge9"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        assert!(client_for(&server)
            .delete_class("LocalKnowledge9")
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_delete_class_failure_is_deletion_error() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v1/schema/LocalKnowledge9"))
            .respond_with(ResponseTemplate::new(500).set_body_string("disk full"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .delete_class("LocalKnowledge9")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Deletion(ref m) if m.contains("disk full")));
    }

    #[tokio::test]
    async fn test_unreachable_store_is_connection_error() {
        let client =
            WeaviateClient::with_base_url("http://127.0.0.1:1", Duration::from_secs(1)).unwrap();
        let err = client.list_classes().await.unwrap_err();
        assert!(matches!(err, AppError::Connection(_)));
    }
}
