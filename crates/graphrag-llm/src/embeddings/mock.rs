//! Deterministic offline embedding provider
//!
//! Hashes each lower-cased word into one of `dimensions` buckets with a
//! SHA-256 derived sign, then L2-normalizes. Texts sharing words land close
//! together, so vector search behaves sensibly without a model server.

use async_trait::async_trait;
use graphrag_core::{EmbeddingProvider, EmbeddingResponse, LlmResult};
use sha2::{Digest, Sha256};

pub const MOCK_MODEL: &str = "mock-embedding";

#[derive(Debug, Clone)]
pub struct MockEmbeddingProvider {
    model: String,
    dimensions: usize,
}

impl MockEmbeddingProvider {
    pub fn with_dimensions(dimensions: usize) -> Self {
        Self {
            model: MOCK_MODEL.to_string(),
            dimensions: dimensions.max(1),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn vector_for(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        for word in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let digest = Sha256::digest(word.as_bytes());
            let mut bucket = [0u8; 8];
            bucket.copy_from_slice(&digest[..8]);
            let slot = (u64::from_le_bytes(bucket) % self.dimensions as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[slot] += sign;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed(&self, text: &str) -> LlmResult<EmbeddingResponse> {
        Ok(EmbeddingResponse::new(self.vector_for(text), self.model.clone())
            .with_tokens(text.split_whitespace().count()))
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn provider_name(&self) -> &str {
        "mock"
    }
}
