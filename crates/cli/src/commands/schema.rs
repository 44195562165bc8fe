//! Schema command handler.

use clap::Args;
use vecbase_core::AppResult;
use vecbase_knowledge::{SchemaStatus, VectorStoreService};

/// Ensure the class for a knowledge base exists
#[derive(Args, Debug)]
pub struct SchemaCommand {
    /// Knowledge base id
    pub kid: String,

    /// Vector model name recorded with the request
    #[arg(long, default_value = "")]
    pub model: String,
}

impl SchemaCommand {
    pub async fn execute(&self, service: &VectorStoreService) -> AppResult<()> {
        tracing::info!("Executing schema command for knowledge base '{}'", self.kid);

        let class_name = service.session().class_name(&self.kid)?;
        match service.ensure_schema(&self.kid, &self.model).await? {
            SchemaStatus::Existing => println!("Class '{}' already exists", class_name),
            SchemaStatus::Created => println!("Created class '{}'", class_name),
            SchemaStatus::Unverified { reason } => {
                println!("Could not verify class '{}': {}", class_name, reason)
            }
        }

        Ok(())
    }
}
