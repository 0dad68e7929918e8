//! Ollama embedding provider (`POST /api/embed`)

use super::check_dimensions;
use crate::http::{endpoint, send_json};
use async_trait::async_trait;
use graphrag_config::EmbeddingModelConfig;
use graphrag_core::{EmbeddingProvider, EmbeddingResponse, LlmError, LlmResult};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Ollama embedding provider
pub struct OllamaEmbeddingProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    dimensions: usize,
    timeout: Duration,
}

impl OllamaEmbeddingProvider {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, dimensions: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            model: model.into(),
            dimensions,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn from_config(config: &EmbeddingModelConfig) -> Self {
        let base_url = config.get_api_url().unwrap_or("http://localhost:11434");
        Self::new(base_url, config.get_model(), config.get_dimensions())
            .with_timeout(Duration::from_secs(config.timeout_secs()))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
    #[serde(default)]
    prompt_eval_count: Option<usize>,
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbeddingProvider {
    async fn embed(&self, text: &str) -> LlmResult<EmbeddingResponse> {
        self.embed_batch(vec![text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| LlmError::InvalidResponse("Ollama returned no embeddings".to_string()))
    }

    async fn embed_batch(&self, texts: Vec<String>) -> LlmResult<Vec<EmbeddingResponse>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = self
            .client
            .post(endpoint(&self.base_url, "/api/embed"))
            .json(&serde_json::json!({
                "model": self.model,
                "input": texts,
            }));

        let response: OllamaEmbedResponse = send_json("Ollama", request, self.timeout).await?;
        if response.embeddings.len() != texts.len() {
            return Err(LlmError::InvalidResponse(format!(
                "Ollama returned {} embeddings for {} inputs",
                response.embeddings.len(),
                texts.len()
            )));
        }
        debug!("Ollama embedded {} texts with {}", texts.len(), self.model);

        // Ollama reports one token count for the whole batch
        let tokens = response.prompt_eval_count.filter(|_| texts.len() == 1);
        response
            .embeddings
            .into_iter()
            .map(|embedding| {
                check_dimensions(&embedding, self.dimensions, &self.model)?;
                let response = EmbeddingResponse::new(embedding, self.model.clone());
                Ok(match tokens {
                    Some(tokens) => response.with_tokens(tokens),
                    None => response,
                })
            })
            .collect()
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn provider_name(&self) -> &str {
        "Ollama"
    }
}
