//! Record removal by knowledge base, document or fragment.

use crate::session::StoreSession;
use crate::store::WhereFilter;
use crate::types::{DeleteSummary, PROP_DOC_ID, PROP_FID};
use tracing::{error, info, instrument};
use vecbase_core::{AppError, AppResult};

/// Removes records. Deleting something that does not exist succeeds.
#[derive(Debug, Clone)]
pub struct DeletionService {
    session: StoreSession,
}

impl DeletionService {
    pub fn new(session: StoreSession) -> Self {
        Self { session }
    }

    /// Drop the knowledge base's class with all its records.
    ///
    /// # Errors
    /// * `AppError::Deletion` - The store failed to drop the class
    #[instrument(skip(self))]
    pub async fn remove_knowledge_base(&self, kid: &str) -> AppResult<()> {
        let class_name = self.session.class_name(kid)?;

        self.session
            .store()
            .delete_class(&class_name)
            .await
            .map_err(|e| match e {
                AppError::Deletion(_) => e,
                other => AppError::Deletion(format!(
                    "Failed to drop class '{}': {}",
                    class_name, other
                )),
            })?;

        info!("Removed knowledge base '{}' (class '{}')", kid, class_name);
        Ok(())
    }

    /// Delete every record of the document. Returns `None` when the store failed.
    pub async fn remove_by_document(
        &self,
        kid: &str,
        doc_id: &str,
    ) -> AppResult<Option<DeleteSummary>> {
        self.remove_where(kid, WhereFilter::equal(PROP_DOC_ID, doc_id))
            .await
    }

    /// Delete every record of the fragment. Returns `None` when the store failed.
    pub async fn remove_by_fragment(
        &self,
        kid: &str,
        fid: &str,
    ) -> AppResult<Option<DeleteSummary>> {
        self.remove_where(kid, WhereFilter::equal(PROP_FID, fid)).await
    }

    #[instrument(skip(self, filter), fields(property = filter.property()))]
    async fn remove_where(
        &self,
        kid: &str,
        filter: WhereFilter,
    ) -> AppResult<Option<DeleteSummary>> {
        let class_name = self.session.class_name(kid)?;

        // A knowledge base without a class has nothing to delete. When the
        // listing itself fails, the delete below reports the real error.
        if let Ok(classes) = self.session.store().list_classes().await {
            if !classes.iter().any(|c| c == &class_name) {
                info!(
                    "Class '{}' does not exist; nothing to delete where {} = '{}'",
                    class_name,
                    filter.property(),
                    filter.value_text
                );
                return Ok(Some(DeleteSummary::default()));
            }
        }

        match self.session.store().delete_where(&class_name, &filter).await {
            Ok(summary) => {
                info!(
                    "Deleted {} of {} matching records from '{}' where {} = '{}' ({} failed)",
                    summary.successful,
                    summary.matches,
                    class_name,
                    filter.property(),
                    filter.value_text,
                    summary.failed
                );
                Ok(Some(summary))
            }
            Err(e) => {
                error!(
                    "Failed to delete records from '{}' where {} = '{}': {}",
                    class_name,
                    filter.property(),
                    filter.value_text,
                    e
                );
                Ok(None)
            }
        }
    }
}
