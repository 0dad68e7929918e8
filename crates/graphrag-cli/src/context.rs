//! Everything a command needs, built once per invocation

use crate::factories;
use anyhow::{Context as _, Result};
use graphrag_config::Config;
use graphrag_core::{ChatProvider, GraphBackend, GraphRagService, Namespace};
use std::sync::Arc;

pub struct Context {
    pub config: Config,
    pub service: GraphRagService,
    /// Also drives graph extraction during ingestion
    pub chat: Option<Arc<dyn ChatProvider>>,
}

impl Context {
    /// Open the configured store and providers
    pub async fn from_config(config: Config) -> Result<Self> {
        let backend = factories::create_backend(&config.storage).await?;
        let chat = factories::create_chat(&config);
        Ok(Self::with_backend(config, backend, chat))
    }

    pub fn with_backend(
        config: Config,
        backend: Arc<dyn GraphBackend>,
        chat: Option<Arc<dyn ChatProvider>>,
    ) -> Self {
        let service = factories::build_service(&config, backend, chat.clone());
        Self {
            config,
            service,
            chat,
        }
    }

    pub fn namespace(id: &str) -> Result<Namespace> {
        Namespace::new(id).with_context(|| format!("Invalid knowledge base '{}'", id))
    }

    pub async fn close(&self) -> Result<()> {
        self.service.close().await?;
        Ok(())
    }
}
