//! Builtin `trigram-v1` embedding model.
//!
//! Feature hashing over character trigrams. Text is split into lowercase
//! alphanumeric tokens; each token is wrapped in boundary markers (`^tok$`) so
//! single-character tokens still yield a trigram. Every trigram and every
//! whole token is hashed with FNV-1a into a bucket, with the sign taken from a
//! separate hash bit, and the result is scaled to unit length. Text without
//! alphanumeric tokens falls back to the trigrams of its raw characters.

use crate::embeddings::provider::EmbeddingProvider;
use vecbase_core::{AppError, AppResult};

/// Model id under which the trigram model is registered.
pub const TRIGRAM_MODEL: &str = "trigram-v1";

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Weight of a whole-token feature relative to one of its trigrams.
const TOKEN_WEIGHT: f32 = 0.5;

#[derive(Debug, Clone)]
pub struct TrigramProvider {
    dimensions: usize,
}

fn fnv1a(bytes: &[u8], seed: u8) -> u64 {
    let mut hash = FNV_OFFSET ^ seed as u64;
    for b in bytes {
        hash ^= *b as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

fn tokens(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

impl TrigramProvider {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn add_feature(&self, vector: &mut [f32], feature: &str, weight: f32) {
        let hash = fnv1a(feature.as_bytes(), 0);
        let bucket = (hash % vector.len() as u64) as usize;
        let sign = if fnv1a(feature.as_bytes(), 1) & 1 == 0 {
            1.0
        } else {
            -1.0
        };
        vector[bucket] += sign * weight;
    }

    fn add_trigrams(&self, vector: &mut [f32], padded: &[char]) {
        for window in padded.windows(3) {
            let trigram: String = window.iter().collect();
            self.add_feature(vector, &trigram, 1.0);
        }
    }

    fn vectorize(&self, text: &str) -> AppResult<Vec<f32>> {
        if self.dimensions == 0 {
            return Err(AppError::Embedding(
                "trigram model configured with zero dimensions".to_string(),
            ));
        }
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(AppError::Embedding("Cannot embed empty text".to_string()));
        }

        let mut vector = vec![0.0f32; self.dimensions];
        let tokens = tokens(trimmed);

        if tokens.is_empty() {
            let padded: Vec<char> = std::iter::once('^')
                .chain(trimmed.chars())
                .chain(std::iter::once('$'))
                .collect();
            self.add_trigrams(&mut vector, &padded);
        }

        for token in &tokens {
            let padded: Vec<char> = std::iter::once('^')
                .chain(token.chars())
                .chain(std::iter::once('$'))
                .collect();
            self.add_trigrams(&mut vector, &padded);
            self.add_feature(&mut vector, token, TOKEN_WEIGHT);
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm == 0.0 {
            return Err(AppError::Embedding(format!(
                "{} produced no features for the given text",
                TRIGRAM_MODEL
            )));
        }
        vector.iter_mut().for_each(|v| *v /= norm);

        Ok(vector)
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for TrigramProvider {
    fn provider_name(&self) -> &str {
        "trigram"
    }

    fn model_name(&self) -> &str {
        TRIGRAM_MODEL
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        texts.iter().map(|text| self.vectorize(text)).collect()
    }
}
