//! Embedding providers
//!
//! Ollama and OpenAI-compatible HTTP providers plus a deterministic mock.
//! [`create_provider`] builds one from a `[[models]]` entry;
//! [`ProviderFactory`] plugs that into the core embedding resolver.

pub mod mock;
pub mod ollama;
pub mod openai;

pub use mock::MockEmbeddingProvider;
pub use ollama::OllamaEmbeddingProvider;
pub use openai::OpenAIEmbeddingProvider;

use graphrag_config::{EmbeddingModelConfig, EmbeddingProviderType};
use graphrag_core::{EmbeddingProvider, EmbeddingProviderFactory, LlmError, LlmResult, ModelDescriptor};
use std::sync::Arc;
use tracing::debug;

/// Create an embedding provider from a model entry
pub fn create_provider(config: &EmbeddingModelConfig) -> LlmResult<Arc<dyn EmbeddingProvider>> {
    if config.get_dimensions() == 0 {
        return Err(LlmError::ConfigError(format!(
            "model '{}' has zero dimensions",
            config.id
        )));
    }

    debug!(
        "Creating {} embedding provider for model '{}' ({})",
        config.provider.as_str(),
        config.id,
        config.get_model()
    );

    match config.provider {
        EmbeddingProviderType::Ollama => Ok(Arc::new(OllamaEmbeddingProvider::from_config(config))),
        EmbeddingProviderType::OpenAI => Ok(Arc::new(OpenAIEmbeddingProvider::from_config(config)?)),
        EmbeddingProviderType::Mock => Ok(Arc::new(
            MockEmbeddingProvider::with_dimensions(config.get_dimensions())
                .with_model(config.get_model()),
        )),
    }
}

/// [`EmbeddingProviderFactory`] backed by [`create_provider`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ProviderFactory;

impl EmbeddingProviderFactory for ProviderFactory {
    fn create(&self, model: &ModelDescriptor) -> LlmResult<Arc<dyn EmbeddingProvider>> {
        create_provider(model)
    }
}

pub(crate) fn check_dimensions(embedding: &[f32], expected: usize, model: &str) -> LlmResult<()> {
    if embedding.len() == expected {
        Ok(())
    } else {
        Err(LlmError::InvalidResponse(format!(
            "model '{}' returned {} dimensions, expected {}",
            model,
            embedding.len(),
            expected
        )))
    }
}
