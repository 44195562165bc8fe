//! Per-knowledge-base class provisioning.

use crate::session::StoreSession;
use crate::store::ClassDefinition;
use crate::types::SchemaStatus;
use tracing::{debug, error, info, instrument};
use vecbase_core::AppResult;

/// Makes sure every knowledge base has its class before anything is written.
#[derive(Debug, Clone)]
pub struct SchemaManager {
    session: StoreSession,
}

impl SchemaManager {
    pub fn new(session: StoreSession) -> Self {
        Self { session }
    }

    /// Create the class for `kid` unless it already exists.
    ///
    /// Store failures are logged and reported as [`SchemaStatus::Unverified`];
    /// only an invalid kid is an `Err`. `model_name` is recorded in the log.
    #[instrument(skip(self), fields(backend = self.session.store().backend_name()))]
    pub async fn ensure_schema(&self, kid: &str, model_name: &str) -> AppResult<SchemaStatus> {
        let class_name = self.session.class_name(kid)?;
        let store = self.session.store();

        let classes = match store.list_classes().await {
            Ok(classes) => classes,
            Err(e) => {
                error!("Failed to list schema for knowledge base '{}': {}", kid, e);
                return Ok(SchemaStatus::Unverified {
                    reason: e.to_string(),
                });
            }
        };

        if classes.iter().any(|c| c == &class_name) {
            debug!("Class '{}' already exists", class_name);
            return Ok(SchemaStatus::Existing);
        }

        match store
            .create_class(&ClassDefinition::knowledge_base(&class_name))
            .await
        {
            Ok(()) => {
                info!(
                    "Created class '{}' for knowledge base '{}' (model '{}')",
                    class_name, kid, model_name
                );
                Ok(SchemaStatus::Created)
            }
            Err(e) => {
                error!("Failed to create class '{}': {}", class_name, e);
                Ok(SchemaStatus::Unverified {
                    reason: e.to_string(),
                })
            }
        }
    }
}
