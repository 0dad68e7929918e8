//! Composition root: concrete backends and providers wired behind the core traits

use anyhow::{Context, Result};
use graphrag_config::{BackendKind, Config, StorageConfig};
use graphrag_core::{
    ChatProvider, EmbeddingResolver, GraphBackend, GraphRagService, GraphStore, HybridOptions,
    InMemoryGraphBackend, StaticDirectory,
};
use graphrag_llm::{create_chat_provider, ProviderFactory};
use graphrag_surrealdb::SurrealGraphBackend;
use std::sync::Arc;
use tracing::{debug, warn};

/// Open the configured graph backend
pub async fn create_backend(config: &StorageConfig) -> Result<Arc<dyn GraphBackend>> {
    match config.backend {
        BackendKind::Memory => {
            debug!("Using in-memory graph backend");
            Ok(Arc::new(InMemoryGraphBackend::new()))
        }
        BackendKind::SurrealDb => {
            if !config.is_in_memory() {
                let path = config.database_path();
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create database directory {}", parent.display())
                    })?;
                }
                debug!("Opening SurrealDB graph at {}", path.display());
            }
            let backend = SurrealGraphBackend::from_config(config)
                .await
                .context("Failed to open SurrealDB graph store")?;
            Ok(Arc::new(backend))
        }
    }
}

/// Resolver over the configured knowledge bases and models
pub fn create_resolver(config: &Config) -> Arc<EmbeddingResolver> {
    let directory = Arc::new(StaticDirectory::from_config(config));
    Arc::new(EmbeddingResolver::new(
        directory.clone(),
        directory,
        Arc::new(ProviderFactory),
    ))
}

/// Chat provider, or `None` (with a warning) when it cannot be built.
/// Retrieval still works without one, on the vector path only.
pub fn create_chat(config: &Config) -> Option<Arc<dyn ChatProvider>> {
    if !config.chat.enabled {
        debug!("Chat model disabled in configuration");
        return None;
    }
    match create_chat_provider(&config.chat) {
        Ok(chat) => Some(chat),
        Err(e) => {
            warn!("Chat model unavailable: {}", e);
            None
        }
    }
}

/// Assemble the service from configuration
pub async fn create_service(config: &Config) -> Result<GraphRagService> {
    let backend = create_backend(&config.storage).await?;
    Ok(build_service(config, backend, create_chat(config)))
}

/// Assemble the service around an existing backend and chat model
pub fn build_service(
    config: &Config,
    backend: Arc<dyn GraphBackend>,
    chat: Option<Arc<dyn ChatProvider>>,
) -> GraphRagService {
    let store = GraphStore::with_index_config(backend, config.vector_index.clone());
    let mut service = GraphRagService::new(store, create_resolver(config))
        .with_defaults(HybridOptions::from_config(&config.retrieval))
        .with_temperature(config.chat.temperature())
        .with_extraction_config(&config.extraction);
    if let Some(chat) = chat {
        service = service.with_chat(chat);
    }
    service
}
