//! OpenAI-compatible embedding provider (`POST /embeddings`)

use super::check_dimensions;
use crate::http::{endpoint, send_json};
use async_trait::async_trait;
use graphrag_config::EmbeddingModelConfig;
use graphrag_core::{EmbeddingProvider, EmbeddingResponse, LlmError, LlmResult};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// OpenAI embedding provider. Works with any server speaking the same API.
pub struct OpenAIEmbeddingProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
    dimensions: usize,
    timeout: Duration,
}

impl OpenAIEmbeddingProvider {
    pub fn new(
        api_key: Option<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        dimensions: usize,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: base_url.into(),
            model: model.into(),
            dimensions,
            timeout: Duration::from_secs(30),
        }
    }

    /// Build from a model entry. The official endpoint requires an API key;
    /// self-hosted compatible servers may run without one.
    pub fn from_config(config: &EmbeddingModelConfig) -> LlmResult<Self> {
        let api_key = config.api_key();
        if api_key.is_none() && config.api_url.is_none() {
            return Err(LlmError::ConfigError(format!(
                "model '{}' needs an API key ({})",
                config.id,
                config.api_key_env.as_deref().unwrap_or("OPENAI_API_KEY")
            )));
        }
        let base_url = config.get_api_url().unwrap_or("https://api.openai.com/v1");
        Ok(
            Self::new(api_key, base_url, config.get_model(), config.get_dimensions())
                .with_timeout(Duration::from_secs(config.timeout_secs())),
        )
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Deserialize)]
struct OpenAIEmbeddingList {
    data: Vec<OpenAIEmbedding>,
    #[serde(default)]
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIEmbedding {
    embedding: Vec<f32>,
    index: usize,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: usize,
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddingProvider {
    async fn embed(&self, text: &str) -> LlmResult<EmbeddingResponse> {
        self.embed_batch(vec![text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| LlmError::InvalidResponse("OpenAI returned no embeddings".to_string()))
    }

    async fn embed_batch(&self, texts: Vec<String>) -> LlmResult<Vec<EmbeddingResponse>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut request = self
            .client
            .post(endpoint(&self.base_url, "embeddings"))
            .json(&serde_json::json!({
                "model": self.model,
                "input": texts,
            }));
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let mut list: OpenAIEmbeddingList = send_json("OpenAI", request, self.timeout).await?;
        if list.data.len() != texts.len() {
            return Err(LlmError::InvalidResponse(format!(
                "OpenAI returned {} embeddings for {} inputs",
                list.data.len(),
                texts.len()
            )));
        }
        debug!("OpenAI embedded {} texts with {}", texts.len(), self.model);

        // results may arrive out of input order
        list.data.sort_by_key(|item| item.index);
        let tokens = list
            .usage
            .map(|usage| usage.prompt_tokens)
            .filter(|_| texts.len() == 1);

        list.data
            .into_iter()
            .map(|item| {
                check_dimensions(&item.embedding, self.dimensions, &self.model)?;
                let response = EmbeddingResponse::new(item.embedding, self.model.clone());
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
        "OpenAI"
    }
}
