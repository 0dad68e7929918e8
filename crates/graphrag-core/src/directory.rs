//! Configuration-backed knowledge-base and model directories

use crate::traits::{KnowledgeBase, KnowledgeBaseDirectory, ModelDescriptor, ModelDirectory};
use crate::types::Namespace;
use graphrag_config::{Config, EmbeddingModelConfig, KnowledgeBaseConfig};
use std::collections::HashMap;

/// Directory built once from `[[knowledge_bases]]`, `[[models]]` and the
/// optional `[embedding]` default.
///
/// Namespaces not declared in the config resolve to the default embedding
/// model when one is configured, and to nothing otherwise.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    knowledge_bases: HashMap<String, KnowledgeBaseConfig>,
    models: HashMap<String, EmbeddingModelConfig>,
    default_model: Option<String>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &Config) -> Self {
        let mut directory = Self::new();
        for model in &config.models {
            directory = directory.with_model(model.clone());
        }
        if let Some(default) = &config.embedding {
            directory.default_model = Some(default.id.clone());
            directory
                .models
                .entry(default.id.clone())
                .or_insert_with(|| default.clone());
        }
        for kb in &config.knowledge_bases {
            directory = directory.with_knowledge_base(kb.clone());
        }
        directory
    }

    pub fn with_model(mut self, model: EmbeddingModelConfig) -> Self {
        self.models.insert(model.id.clone(), model);
        self
    }

    pub fn with_knowledge_base(mut self, kb: KnowledgeBaseConfig) -> Self {
        self.knowledge_bases.insert(kb.id.clone(), kb);
        self
    }

    /// Model used by namespaces that are not declared explicitly
    pub fn with_default_model(mut self, model: EmbeddingModelConfig) -> Self {
        self.default_model = Some(model.id.clone());
        self.with_model(model)
    }
}

impl KnowledgeBaseDirectory for StaticDirectory {
    fn knowledge_base(&self, namespace: &Namespace) -> Option<KnowledgeBase> {
        match self.knowledge_bases.get(namespace.as_str()) {
            Some(kb) => Some(KnowledgeBase {
                namespace: namespace.clone(),
                name: kb.display_name().to_string(),
                embedding_model: kb.embedding_model.clone(),
            }),
            None => self.default_model.as_ref().map(|model| KnowledgeBase {
                namespace: namespace.clone(),
                name: namespace.to_string(),
                embedding_model: Some(model.clone()),
            }),
        }
    }
}

impl ModelDirectory for StaticDirectory {
    fn model(&self, model_id: &str) -> Option<ModelDescriptor> {
        self.models.get(model_id).cloned()
    }
}
