//! Knowledge base registry

use serde::{Deserialize, Serialize};

/// A knowledge base (`[[knowledge_bases]]`). Its `id` is the graph namespace.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KnowledgeBaseConfig {
    /// Namespace identifier
    pub id: String,
    /// Display name
    pub name: Option<String>,
    /// Id of the embedding model entry in `[[models]]`
    pub embedding_model: Option<String>,
}

impl KnowledgeBaseConfig {
    /// Display name, falling back to the id
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}
