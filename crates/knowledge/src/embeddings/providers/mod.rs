//! Embedding provider implementations.

pub mod ollama;
pub mod openai;
pub mod trigram;

pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;
pub use trigram::TrigramProvider;
