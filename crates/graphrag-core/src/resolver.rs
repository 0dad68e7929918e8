//! Per-namespace embedding model resolution
//!
//! namespace → knowledge base → model id → model config → provider.
//! Any missing link logs a warning and resolves to `None`, leaving the
//! entity-match path to work on its own.

use crate::traits::{
    EmbeddingProvider, EmbeddingProviderFactory, KnowledgeBaseDirectory, ModelDirectory,
};
use crate::types::Namespace;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

struct Lookups {
    knowledge_bases: Arc<dyn KnowledgeBaseDirectory>,
    models: Arc<dyn ModelDirectory>,
    factory: Arc<dyn EmbeddingProviderFactory>,
}

/// Resolves and caches embedding providers by model id
pub struct EmbeddingResolver {
    lookups: Option<Lookups>,
    providers: Mutex<HashMap<String, Arc<dyn EmbeddingProvider>>>,
}

impl EmbeddingResolver {
    pub fn new(
        knowledge_bases: Arc<dyn KnowledgeBaseDirectory>,
        models: Arc<dyn ModelDirectory>,
        factory: Arc<dyn EmbeddingProviderFactory>,
    ) -> Self {
        Self {
            lookups: Some(Lookups {
                knowledge_bases,
                models,
                factory,
            }),
            providers: Mutex::new(HashMap::new()),
        }
    }

    /// Resolver with no embedding models at all
    pub fn disabled() -> Self {
        Self {
            lookups: None,
            providers: Mutex::new(HashMap::new()),
        }
    }

    /// Provider for `namespace`, or `None` when anything along the chain is missing
    pub fn resolve(&self, namespace: &Namespace) -> Option<Arc<dyn EmbeddingProvider>> {
        let Some(lookups) = &self.lookups else {
            debug!(namespace = %namespace, "Embedding resolution disabled");
            return None;
        };

        let Some(kb) = lookups.knowledge_bases.knowledge_base(namespace) else {
            warn!(namespace = %namespace, "Knowledge base not found, vector search disabled");
            return None;
        };
        let Some(model_id) = kb.embedding_model else {
            warn!(namespace = %namespace, "Knowledge base has no embedding model, vector search disabled");
            return None;
        };

        if let Some(provider) = self.providers.lock().get(&model_id) {
            return Some(Arc::clone(provider));
        }

        let Some(descriptor) = lookups.models.model(&model_id) else {
            warn!(
                namespace = %namespace,
                model = %model_id,
                "Embedding model configuration not found, vector search disabled"
            );
            return None;
        };

        match lookups.factory.create(&descriptor) {
            Ok(provider) => {
                debug!(
                    namespace = %namespace,
                    model = %model_id,
                    provider = provider.provider_name(),
                    "Resolved embedding model"
                );
                self.providers
                    .lock()
                    .insert(model_id, Arc::clone(&provider));
                Some(provider)
            }
            Err(e) => {
                warn!(
                    namespace = %namespace,
                    model = %model_id,
                    "Failed to create embedding provider: {}",
                    e
                );
                None
            }
        }
    }
}

impl std::fmt::Debug for EmbeddingResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingResolver")
            .field("enabled", &self.lookups.is_some())
            .field("cached", &self.providers.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::StaticDirectory;
    use crate::test_support::{KeywordEmbedder, StaticEmbeddingFactory};
    use graphrag_config::{EmbeddingModelConfig, EmbeddingProviderType, KnowledgeBaseConfig};

    fn resolver(directory: StaticDirectory) -> EmbeddingResolver {
        let directory = Arc::new(directory);
        EmbeddingResolver::new(
            directory.clone(),
            directory,
            Arc::new(StaticEmbeddingFactory::new(Arc::new(KeywordEmbedder::new()))),
        )
    }

    fn kb(id: &str, model: Option<&str>) -> KnowledgeBaseConfig {
        KnowledgeBaseConfig {
            id: id.to_string(),
            name: None,
            embedding_model: model.map(str::to_string),
        }
    }

    #[test]
    fn test_full_chain_resolves() {
        let resolver = resolver(
            StaticDirectory::new()
                .with_model(EmbeddingModelConfig::new("m1", EmbeddingProviderType::Mock))
                .with_knowledge_base(kb("kb1", Some("m1"))),
        );
        let ns = Namespace::new("kb1").unwrap();
        assert!(resolver.resolve(&ns).is_some());
        // second lookup comes from the cache
        assert!(resolver.resolve(&ns).is_some());
    }

    #[test]
    fn test_each_missing_link_degrades_to_none() {
        let resolver = resolver(
            StaticDirectory::new()
                .with_knowledge_base(kb("no-model", None))
                .with_knowledge_base(kb("dangling", Some("missing"))),
        );
        for id in ["unknown", "no-model", "dangling"] {
            assert!(resolver.resolve(&Namespace::new(id).unwrap()).is_none());
        }
        assert!(EmbeddingResolver::disabled()
            .resolve(&Namespace::new("kb1").unwrap())
            .is_none());
    }
}
