//! Read-only lookups from knowledge bases to their model configuration

use super::embedding::EmbeddingProvider;
use crate::error::LlmResult;
use crate::types::Namespace;
use graphrag_config::EmbeddingModelConfig;
use std::sync::Arc;

/// A knowledge-base record
#[derive(Debug, Clone, PartialEq)]
pub struct KnowledgeBase {
    pub namespace: Namespace,
    pub name: String,
    /// Id of the embedding model configuration, if any
    pub embedding_model: Option<String>,
}

/// An embedding model configuration record
pub type ModelDescriptor = EmbeddingModelConfig;

/// Maps a namespace to its knowledge-base record
pub trait KnowledgeBaseDirectory: Send + Sync {
    fn knowledge_base(&self, namespace: &Namespace) -> Option<KnowledgeBase>;
}

/// Maps a model id to its configuration
pub trait ModelDirectory: Send + Sync {
    fn model(&self, model_id: &str) -> Option<ModelDescriptor>;
}

/// Builds a provider for a model configuration
pub trait EmbeddingProviderFactory: Send + Sync {
    fn create(&self, model: &ModelDescriptor) -> LlmResult<Arc<dyn EmbeddingProvider>>;
}
