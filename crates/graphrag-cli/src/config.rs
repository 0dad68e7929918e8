//! Configuration loading with command-line overrides
//!
//! Precedence: CLI flags, then `GRAPHRAG_*` environment variables, then the
//! config file, then defaults.

use crate::cli::Cli;
use anyhow::{Context, Result};
use graphrag_config::{BackendKind, Config};
use std::path::PathBuf;
use tracing::debug;

/// Overrides taken from global CLI flags
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_path: Option<PathBuf>,
    pub db_path: Option<PathBuf>,
    pub memory: bool,
    pub embedding_url: Option<String>,
    pub chat_model: Option<String>,
}

impl From<&Cli> for CliOverrides {
    fn from(cli: &Cli) -> Self {
        Self {
            config_path: cli.config.clone(),
            db_path: cli.db_path.clone(),
            memory: cli.memory,
            embedding_url: cli.embedding_url.clone(),
            chat_model: cli.chat_model.clone(),
        }
    }
}

/// Load configuration and apply CLI overrides on top
pub fn load(overrides: &CliOverrides) -> Result<Config> {
    let mut config = Config::load(overrides.config_path.clone()).with_context(|| {
        match &overrides.config_path {
            Some(path) => format!("Failed to load config from {}", path.display()),
            None => "Failed to load config".to_string(),
        }
    })?;
    apply_overrides(&mut config, overrides);
    config.validate()?;
    debug!(
        backend = config.storage.backend.as_str(),
        knowledge_bases = config.knowledge_bases.len(),
        models = config.models.len(),
        "Configuration loaded"
    );
    Ok(config)
}

pub fn apply_overrides(config: &mut Config, overrides: &CliOverrides) {
    if overrides.memory {
        config.storage.backend = BackendKind::Memory;
    }
    if let Some(path) = &overrides.db_path {
        config.storage.path = Some(path.clone());
    }
    if let Some(url) = &overrides.embedding_url {
        for model in config.models.iter_mut().chain(config.embedding.as_mut()) {
            model.api_url = Some(url.clone());
        }
    }
    if let Some(model) = &overrides.chat_model {
        config.chat.model = Some(model.clone());
    }
}
