//! Deletion command handlers.

use clap::Args;
use vecbase_core::AppResult;
use vecbase_knowledge::{DeleteSummary, VectorStoreService};

/// Drop a knowledge base with all its records
#[derive(Args, Debug)]
pub struct RemoveKbCommand {
    /// Knowledge base id
    pub kid: String,
}

impl RemoveKbCommand {
    pub async fn execute(&self, service: &VectorStoreService) -> AppResult<()> {
        tracing::info!("Executing remove-kb command for knowledge base '{}'", self.kid);

        service.remove_knowledge_base(&self.kid).await?;
        println!("Knowledge base '{}' removed", self.kid);

        Ok(())
    }
}

/// Delete every record of a document
#[derive(Args, Debug)]
pub struct RemoveDocCommand {
    /// Knowledge base id
    pub kid: String,

    /// Document id
    pub doc_id: String,
}

impl RemoveDocCommand {
    pub async fn execute(&self, service: &VectorStoreService) -> AppResult<()> {
        tracing::info!(
            "Executing remove-doc command for document '{}' in '{}'",
            self.doc_id,
            self.kid
        );

        let summary = service.remove_by_document(&self.kid, &self.doc_id).await?;
        report(&format!("document '{}'", self.doc_id), summary);

        Ok(())
    }
}

/// Delete every record of a fragment
#[derive(Args, Debug)]
pub struct RemoveFragmentCommand {
    /// Knowledge base id
    pub kid: String,

    /// Fragment id
    pub fid: String,
}

impl RemoveFragmentCommand {
    pub async fn execute(&self, service: &VectorStoreService) -> AppResult<()> {
        tracing::info!(
            "Executing remove-fragment command for fragment '{}' in '{}'",
            self.fid,
            self.kid
        );

        let summary = service.remove_by_fragment(&self.kid, &self.fid).await?;
        report(&format!("fragment '{}'", self.fid), summary);

        Ok(())
    }
}

fn report(target: &str, summary: Option<DeleteSummary>) {
    match summary {
        Some(s) => println!(
            "Deleted {} of {} records for {} ({} failed)",
            s.successful, s.matches, target, s.failed
        ),
        None => println!("Deletion for {} failed; see log for details", target),
    }
}
