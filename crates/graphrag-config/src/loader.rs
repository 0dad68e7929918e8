//! Root configuration and file loading

use crate::components::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// Path that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for this schema
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Root configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Graph storage backend
    #[serde(default)]
    pub storage: StorageConfig,
    /// Default embedding model for namespaces not listed in `[[knowledge_bases]]`
    #[serde(default)]
    pub embedding: Option<EmbeddingModelConfig>,
    /// Chat model
    #[serde(default)]
    pub chat: ChatConfig,
    /// Hybrid retrieval defaults
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    /// Vector index settings
    #[serde(default)]
    pub vector_index: VectorIndexConfig,
    /// Graph extraction
    #[serde(default)]
    pub extraction: ExtractionConfig,
    /// Known knowledge bases
    #[serde(default)]
    pub knowledge_bases: Vec<KnowledgeBaseConfig>,
    /// Known embedding models
    #[serde(default)]
    pub models: Vec<EmbeddingModelConfig>,
}

impl Config {
    /// Default config file location (`~/.config/graphrag/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("graphrag").join("config.toml"))
    }

    /// Parse configuration from a TOML string
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Loaded config from {}", path.display());
        Self::from_toml_str(&content)
    }

    /// Load configuration: explicit file, else the default file if present,
    /// else defaults. Environment overrides are applied last.
    pub fn load(path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(path) => Self::load_from_file(&path)?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => Self::load_from_file(&path)?,
                None => {
                    debug!("No config file found, using defaults");
                    Self::default()
                }
            },
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply `GRAPHRAG_*` environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("GRAPHRAG_DB_PATH") {
            self.storage.path = Some(PathBuf::from(path));
        }
        if let Ok(model) = std::env::var("GRAPHRAG_CHAT_MODEL") {
            self.chat.model = Some(model);
        }
        if let Ok(endpoint) = std::env::var("GRAPHRAG_CHAT_URL") {
            self.chat.endpoint = Some(endpoint);
        }
        if let Ok(url) = std::env::var("GRAPHRAG_EMBEDDING_URL") {
            for model in self.models.iter_mut().chain(self.embedding.as_mut()) {
                model.api_url = Some(url.clone());
            }
        }
    }

    /// Validate numeric ranges. Dangling model references are only warned
    /// about: such knowledge bases simply run without a vector path.
    pub fn validate(&self) -> ConfigResult<()> {
        let retrieval = &self.retrieval;
        if !(1..=2).contains(&retrieval.hop_depth) {
            return Err(ConfigError::Invalid(format!(
                "retrieval.hop_depth must be 1 or 2, got {}",
                retrieval.hop_depth
            )));
        }
        if !(0.0..=1.0).contains(&retrieval.vector_score_threshold) {
            return Err(ConfigError::Invalid(format!(
                "retrieval.vector_score_threshold must be within [0, 1], got {}",
                retrieval.vector_score_threshold
            )));
        }
        if retrieval.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "retrieval.request_timeout_secs must be positive".to_string(),
            ));
        }
        if self.vector_index.default_dimensions == 0 {
            return Err(ConfigError::Invalid(
                "vector_index.default_dimensions must be positive".to_string(),
            ));
        }

        for kb in &self.knowledge_bases {
            if let Some(model_id) = &kb.embedding_model {
                if self.model(model_id).is_none() {
                    warn!(
                        "Knowledge base '{}' references unknown embedding model '{}'",
                        kb.id, model_id
                    );
                }
            }
        }
        Ok(())
    }

    /// Look up a knowledge base by id
    pub fn knowledge_base(&self, id: &str) -> Option<&KnowledgeBaseConfig> {
        self.knowledge_bases.iter().find(|kb| kb.id == id)
    }

    /// Look up an embedding model by id, including the `[embedding]` default
    pub fn model(&self, id: &str) -> Option<&EmbeddingModelConfig> {
        self.models
            .iter()
            .chain(self.embedding.as_ref())
            .find(|m| m.id == id)
    }
}
