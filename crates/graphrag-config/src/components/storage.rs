//! Storage component configuration
//!
//! Selects the graph backend and where it keeps its data.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Graph backend selection
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Embedded SurrealDB (RocksDB file, or in-memory when `path = ":memory:"`)
    #[default]
    SurrealDb,
    /// Process-local in-memory graph, lost on exit
    Memory,
}

impl BackendKind {
    /// Get the backend name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SurrealDb => "surrealdb",
            Self::Memory => "memory",
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Backend to use
    #[serde(default)]
    pub backend: BackendKind,
    /// Database directory. `":memory:"` selects the in-memory SurrealDB engine.
    pub path: Option<PathBuf>,
    /// SurrealDB namespace (unrelated to knowledge-base namespaces)
    #[serde(default = "default_surreal_namespace")]
    pub surreal_namespace: String,
    /// SurrealDB database name
    #[serde(default = "default_database")]
    pub database: String,
}

fn default_surreal_namespace() -> String {
    "graphrag".to_string()
}

fn default_database() -> String {
    "graph".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            path: None,
            surreal_namespace: default_surreal_namespace(),
            database: default_database(),
        }
    }
}

impl StorageConfig {
    /// Resolve the database path, falling back to the platform data directory
    pub fn database_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|dir| dir.join("graphrag").join("graph.db"))
                .unwrap_or_else(|| PathBuf::from("./graphrag.db"))
        })
    }

    /// Whether the configured SurrealDB store lives in memory only
    pub fn is_in_memory(&self) -> bool {
        matches!(self.backend, BackendKind::Memory)
            || self
                .path
                .as_ref()
                .is_some_and(|p| p.as_os_str() == ":memory:")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_defaults_to_surrealdb() {
        let config = StorageConfig::default();
        assert_eq!(config.backend, BackendKind::SurrealDb);
        assert!(!config.is_in_memory());
    }

    #[test]
    fn test_memory_path_is_in_memory() {
        let toml = r#"
            path = ":memory:"
        "#;
        let config: StorageConfig = toml::from_str(toml).unwrap();
        assert!(config.is_in_memory());
        assert_eq!(config.surreal_namespace, "graphrag");
    }

    #[test]
    fn test_memory_backend_parses() {
        let config: StorageConfig = toml::from_str(r#"backend = "memory""#).unwrap();
        assert_eq!(config.backend, BackendKind::Memory);
        assert!(config.is_in_memory());
    }
}
