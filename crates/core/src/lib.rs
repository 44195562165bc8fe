//! vecbase core library
//!
//! Foundational utilities shared by the vecbase crates:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management (`AppConfig`, `ConfigSource`)

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::{AppConfig, ConfigSource};
pub use error::{AppError, AppResult};
