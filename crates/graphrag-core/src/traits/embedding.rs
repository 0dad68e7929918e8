//! Embedding provider abstraction

use crate::error::LlmResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Response from an embedding request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    /// The embedding vector
    pub embedding: Vec<f32>,
    /// Dimensions of the vector
    pub dimensions: usize,
    /// Model that produced it
    pub model: String,
    /// Token count, when the provider reports one
    pub tokens: Option<usize>,
}

impl EmbeddingResponse {
    pub fn new(embedding: Vec<f32>, model: impl Into<String>) -> Self {
        let dimensions = embedding.len();
        Self {
            embedding,
            dimensions,
            model: model.into(),
            tokens: None,
        }
    }

    pub fn with_tokens(mut self, tokens: usize) -> Self {
        self.tokens = Some(tokens);
        self
    }
}

/// Turns text into fixed-dimension vectors
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text
    async fn embed(&self, text: &str) -> LlmResult<EmbeddingResponse>;

    /// Embed several texts, returning one response per input in order.
    ///
    /// The default calls `embed` sequentially; providers with a batch
    /// endpoint override it.
    async fn embed_batch(&self, texts: Vec<String>) -> LlmResult<Vec<EmbeddingResponse>> {
        let mut responses = Vec::with_capacity(texts.len());
        for text in &texts {
            responses.push(self.embed(text).await?);
        }
        Ok(responses)
    }

    fn model_name(&self) -> &str;

    fn dimensions(&self) -> usize;

    fn provider_name(&self) -> &str;
}
