//! LLM-backed graph extraction
//!
//! [`LlmGraphTransformer`] asks a chat model for a JSON object of nodes and
//! relationships and parses it tolerantly: the whole reply, or else the
//! outermost `{...}` span. Missing optional fields take defaults; a reply
//! with no JSON object fails the document.

use async_trait::async_trait;
use graphrag_config::{ExtractionConfig, FALLBACK_NODE_TYPE};
use graphrag_core::prompts::extract_json_object;
use graphrag_core::{
    ChatMessage, ChatProvider, ChatRequest, GraphDocument, GraphEdge, GraphError, GraphNode,
    GraphResult, GraphTransformer, SourceDocument,
};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

const SYSTEM_TEMPLATE: &str = r#"You are a top-tier algorithm for extracting information in structured formats to build a knowledge graph.
Extract entities (nodes) and the relationships between them from the text the user provides.

Nodes:
- "id" is the entity's name exactly as a human would write it. Never use numeric ids.
- "type" must be one of: {types}.
- "description" is one short sentence about the entity, taken from the text.

Relationships:
- "source" and "target" are node ids. "source_type" and "target_type" are their types.
- "type" is a short, general description of the relationship, such as "works for" or "located in".
- "description" explains the relationship in one sentence. "strength" is a number from 0 to 1.

Keep entities consistent: if an entity is mentioned several times under different names, always use the most complete name.

Respond with only a JSON object of the form:
{"nodes": [{"id": "...", "type": "...", "description": "..."}], "relationships": [{"source": "...", "source_type": "...", "target": "...", "target_type": "...", "type": "...", "description": "...", "strength": 0.8}]}"#;

/// [`GraphTransformer`] backed by a chat model
pub struct LlmGraphTransformer {
    chat: Arc<dyn ChatProvider>,
    allowed_types: Vec<String>,
    instructions: Option<String>,
    examples: Option<String>,
}

impl LlmGraphTransformer {
    pub fn new(chat: Arc<dyn ChatProvider>) -> Self {
        Self::from_config(chat, &ExtractionConfig::default())
    }

    pub fn from_config(chat: Arc<dyn ChatProvider>, config: &ExtractionConfig) -> Self {
        Self {
            chat,
            allowed_types: config.allowed_node_types.clone(),
            instructions: config.instructions.clone(),
            examples: config.examples.clone(),
        }
    }

    pub fn system_prompt(&self) -> String {
        let mut prompt = SYSTEM_TEMPLATE.replace("{types}", &self.allowed_types.join(", "));
        if let Some(instructions) = self.instructions.as_deref().filter(|s| !s.trim().is_empty()) {
            prompt.push_str("\n\nAdditional instructions:\n");
            prompt.push_str(instructions.trim());
        }
        if let Some(examples) = self.examples.as_deref().filter(|s| !s.trim().is_empty()) {
            prompt.push_str("\n\nExamples:\n");
            prompt.push_str(examples.trim());
        }
        prompt
    }

    fn request(&self, document: &SourceDocument) -> ChatRequest {
        ChatRequest::new(vec![
            ChatMessage::system(self.system_prompt()),
            ChatMessage::user(format!(
                "Extract the knowledge graph from the following text:\n\n{}",
                document.text
            )),
        ])
    }
}

#[async_trait]
impl GraphTransformer for LlmGraphTransformer {
    async fn extract(&self, document: &SourceDocument) -> GraphResult<GraphDocument> {
        if document.text.trim().is_empty() {
            return Ok(GraphDocument::new(document.clone()));
        }

        let reply = self.chat.chat(self.request(document)).await?;
        let graph = parse_graph(&reply, document.clone())?;
        debug!(
            document = %document.id,
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            "Extracted graph with {}",
            self.chat.model_name()
        );
        Ok(graph)
    }
}

/// Parse a model reply into a [`GraphDocument`] for `source`
pub fn parse_graph(reply: &str, source: SourceDocument) -> GraphResult<GraphDocument> {
    let Some(value) = extract_json_object(reply) else {
        warn!(document = %source.id, "Extraction reply contained no JSON object");
        return Err(GraphError::Extraction(format!(
            "no JSON object in model reply for document {}",
            source.id
        )));
    };

    let mut graph = GraphDocument::new(source);
    let mut known: HashSet<String> = HashSet::new();

    for item in array(&value, &["nodes", "entities"]) {
        let Some(id) = text(item, "id").or_else(|| text(item, "name")) else {
            continue;
        };
        let node_type = text(item, "type").unwrap_or_else(|| FALLBACK_NODE_TYPE.to_string());
        known.insert(id.to_lowercase());
        graph.nodes.push(
            GraphNode::new(id, node_type).with_description(text(item, "description").unwrap_or_default()),
        );
    }

    for item in array(&value, &["relationships", "edges"]) {
        let (Some(source), Some(target), Some(relation)) =
            (text(item, "source"), text(item, "target"), text(item, "type"))
        else {
            continue;
        };
        let source_type = text(item, "source_type");
        let target_type = text(item, "target_type");

        // endpoints the model only named inside a relationship
        for (id, node_type) in [(&source, &source_type), (&target, &target_type)] {
            if known.insert(id.to_lowercase()) {
                let node_type = node_type.clone().unwrap_or_else(|| FALLBACK_NODE_TYPE.to_string());
                graph.nodes.push(GraphNode::new(id.clone(), node_type));
            }
        }

        graph.edges.push(GraphEdge {
            source,
            source_type,
            relation,
            target,
            target_type,
            description: text(item, "description").unwrap_or_default(),
            strength: strength(item),
        });
    }

    Ok(graph)
}

fn array<'a>(value: &'a Value, keys: &[&str]) -> &'a [Value] {
    keys.iter()
        .find_map(|key| value.get(*key).and_then(Value::as_array))
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn text(item: &Value, key: &str) -> Option<String> {
    let value = item.get(key)?;
    let raw = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!raw.is_empty()).then_some(raw)
}

fn strength(item: &Value) -> Option<f32> {
    match item.get("strength")? {
        Value::Number(n) => n.as_f64().map(|v| v as f32),
        Value::String(s) => s.trim().parse::<f32>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> SourceDocument {
        SourceDocument::new("Sam Altman is the CEO of OpenAI.")
    }

    #[test]
    fn test_parse_full_reply() {
        let reply = r#"{
            "nodes": [
                {"id": "Sam Altman", "type": "PERSON", "description": "CEO"},
                {"id": "OpenAI", "type": "ORGANIZATION"}
            ],
            "relationships": [
                {"source": "Sam Altman", "source_type": "PERSON", "target": "OpenAI",
                 "target_type": "ORGANIZATION", "type": "CEO of", "strength": 0.9}
            ]
        }"#;
        let graph = parse_graph(reply, source()).unwrap();
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.nodes[0].description, "CEO");
        assert_eq!(graph.nodes[1].description, "");
        assert_eq!(graph.edges[0].relation, "CEO of");
        assert_eq!(graph.edges[0].strength, Some(0.9));
        assert_eq!(graph.edges[0].target_type.as_deref(), Some("ORGANIZATION"));
    }

    #[test]
    fn test_reply_wrapped_in_prose_and_fences() {
        let reply = "Here is the graph:\n```json\n{\"nodes\": [{\"id\": \"Paris\", \"type\": \"LOCATION\"}]}\n```";
        let graph = parse_graph(reply, source()).unwrap();
        assert_eq!(graph.nodes[0].id, "Paris");
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn test_relationship_endpoints_become_nodes() {
        let reply = r#"{"relationships": [{"source": "A", "target": "B", "target_type": "PRODUCT", "type": "makes", "strength": "0.5"}]}"#;
        let graph = parse_graph(reply, source()).unwrap();
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.nodes[0].node_type, FALLBACK_NODE_TYPE);
        assert_eq!(graph.nodes[1].node_type, "PRODUCT");
        assert_eq!(graph.edges[0].strength, Some(0.5));
    }

    #[test]
    fn test_incomplete_items_are_skipped() {
        let reply = r#"{"nodes": [{"type": "PERSON"}, {"id": "  "}, {"id": "Ada"}],
                        "relationships": [{"source": "Ada", "type": "knows"}]}"#;
        let graph = parse_graph(reply, source()).unwrap();
        assert_eq!(graph.nodes.len(), 1);
        assert_eq!(graph.nodes[0].node_type, FALLBACK_NODE_TYPE);
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn test_no_json_is_an_extraction_error() {
        let err = parse_graph("I cannot help with that.", source()).unwrap_err();
        assert!(matches!(err, GraphError::Extraction(_)));
    }

    #[test]
    fn test_system_prompt_lists_types_and_extras() {
        let config = ExtractionConfig {
            allowed_node_types: vec!["GENE".into(), "PROTEIN".into()],
            instructions: Some("Ignore citations.".into()),
            examples: None,
            ..Default::default()
        };
        let chat: Arc<dyn ChatProvider> = Arc::new(graphrag_core::test_support::ScriptedChat::new());
        let transformer = LlmGraphTransformer::from_config(chat, &config);
        let prompt = transformer.system_prompt();
        assert!(prompt.contains("must be one of: GENE, PROTEIN."));
        assert!(prompt.ends_with("Additional instructions:\nIgnore citations."));
        assert!(!prompt.contains("Examples:"));
    }
}
