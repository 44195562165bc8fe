//! Command handlers for the vecbase CLI.

pub mod query;
pub mod remove;
pub mod schema;
pub mod store;

pub use query::QueryCommand;
pub use remove::{RemoveDocCommand, RemoveFragmentCommand, RemoveKbCommand};
pub use schema::SchemaCommand;
pub use store::StoreCommand;

use clap::ValueEnum;
use std::sync::Arc;
use vecbase_core::{config::AppConfig, AppError, AppResult, ConfigSource};
use vecbase_knowledge::{InMemoryVectorStore, ServiceOptions, StoreSession, VectorStoreService};

/// Class prefix used by the in-memory backend when none is configured.
const DEFAULT_MEMORY_PREFIX: &str = "Knowledge";

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Weaviate,
    Memory,
}

/// Build the service for the selected backend.
pub fn open_service(config: &AppConfig, backend: StoreBackend) -> AppResult<VectorStoreService> {
    match backend {
        StoreBackend::Weaviate => VectorStoreService::connect(config),
        StoreBackend::Memory => {
            let prefix = config.get_value_or("weaviate", "classname", DEFAULT_MEMORY_PREFIX);
            let session = StoreSession::new(Arc::new(InMemoryVectorStore::new()), prefix)?;
            Ok(VectorStoreService::new(
                session,
                ServiceOptions::from_config(config)?,
            ))
        }
    }
}

/// Log line for a failed command; store failures name the backend.
pub fn failure_message(backend: StoreBackend, err: &AppError) -> String {
    if err.is_store_failure() {
        format!("Command failed in the {:?} store: {}", backend, err)
    } else {
        format!("Command failed: {}", err)
    }
}

/// Flag value, else `embedding.<key>` from configuration.
pub fn flag_or_config(config: &AppConfig, flag: Option<&str>, key: &str) -> Option<String> {
    flag.map(str::to_string)
        .or_else(|| config.get_value("embedding", key).ok())
        .filter(|v| !v.trim().is_empty())
}
