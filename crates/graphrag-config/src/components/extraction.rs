//! Graph extraction settings

use serde::{Deserialize, Serialize};

/// Entity types the extractor may emit when nothing else is configured
pub const DEFAULT_NODE_TYPES: &[&str] = &[
    "ORGANIZATION",
    "PERSON",
    "LOCATION",
    "EVENT",
    "DATE",
    "PRODUCT",
    "CONCEPT",
    "TECHNOLOGY",
];

/// Label assigned to nodes whose type is not in the allow-list
pub const FALLBACK_NODE_TYPE: &str = "CONCEPT";

/// Extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractionConfig {
    /// Allow-list of node type labels
    #[serde(default = "default_node_types")]
    pub allowed_node_types: Vec<String>,
    /// Extra instructions appended to the extraction prompt
    pub instructions: Option<String>,
    /// Worked examples appended to the extraction prompt
    pub examples: Option<String>,
    /// Link every entity to a source document node
    #[serde(default = "default_true")]
    pub include_source: bool,
    /// Compute node embeddings during ingestion
    #[serde(default = "default_true")]
    pub with_embedding: bool,
}

fn default_node_types() -> Vec<String> {
    DEFAULT_NODE_TYPES.iter().map(|t| t.to_string()).collect()
}

fn default_true() -> bool {
    true
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            allowed_node_types: default_node_types(),
            instructions: None,
            examples: None,
            include_source: true,
            with_embedding: true,
        }
    }
}
