//! Store session: a vector store handle plus the class naming convention.

use crate::store::{VectorStore, WeaviateClient};
use std::sync::Arc;
use std::time::Duration;
use vecbase_core::{AppError, AppResult, ConfigSource};

/// Config namespace holding the store connection settings.
pub const STORE_NAMESPACE: &str = "weaviate";

/// Handle shared by every component that touches the store.
///
/// Cloning shares the underlying connection.
#[derive(Debug, Clone)]
pub struct StoreSession {
    store: Arc<dyn VectorStore>,
    class_prefix: String,
}

impl StoreSession {
    /// Wrap an existing store.
    ///
    /// # Errors
    /// * `AppError::Config` - The prefix is empty, does not start with an ASCII
    ///   letter, or contains characters other than ASCII letters, digits and `_`
    pub fn new(store: Arc<dyn VectorStore>, class_prefix: impl Into<String>) -> AppResult<Self> {
        let class_prefix = class_prefix.into();
        validate_prefix(&class_prefix)?;

        Ok(Self {
            store,
            class_prefix,
        })
    }

    /// Open a Weaviate session from `weaviate.protocol`, `weaviate.host` and
    /// `weaviate.classname`.
    pub fn connect(config: &dyn ConfigSource, timeout: Duration) -> AppResult<Self> {
        let protocol = config.get_value(STORE_NAMESPACE, "protocol")?;
        let host = config.get_value(STORE_NAMESPACE, "host")?;
        let class_prefix = config.get_value(STORE_NAMESPACE, "classname")?;

        let client = WeaviateClient::new(&protocol, &host, timeout)?;
        tracing::debug!(
            "Opened Weaviate session at {} with class prefix '{}'",
            client.base_url(),
            class_prefix
        );

        Self::new(Arc::new(client), class_prefix)
    }

    pub fn store(&self) -> &dyn VectorStore {
        self.store.as_ref()
    }

    pub fn prefix(&self) -> &str {
        &self.class_prefix
    }

    /// Class name of a knowledge base: `<prefix><kid>`.
    ///
    /// # Errors
    /// * `AppError::InvalidRequest` - The kid is empty or not a valid class-name suffix
    pub fn class_name(&self, kid: &str) -> AppResult<String> {
        if kid.is_empty() {
            return Err(AppError::InvalidRequest(
                "Knowledge base id must not be empty".to_string(),
            ));
        }
        if !kid.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(AppError::InvalidRequest(format!(
                "Knowledge base id '{}' may only contain ASCII letters, digits and '_'",
                kid
            )));
        }

        Ok(format!("{}{}", self.class_prefix, kid))
    }
}

/// Weaviate capitalises class names; the prefix must already start uppercase.
fn validate_prefix(prefix: &str) -> AppResult<()> {
    let mut chars = prefix.chars();
    let starts_uppercase = chars.next().is_some_and(|c| c.is_ascii_uppercase());
    if !starts_uppercase || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(AppError::Config(format!(
            "Invalid class prefix '{}': must start with an uppercase letter \
             and contain only ASCII letters, digits and '_'",
            prefix
        )));
    }
    Ok(())
}
