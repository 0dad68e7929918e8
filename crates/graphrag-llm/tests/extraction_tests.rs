//! LlmGraphTransformer driving a full ingestion and hybrid query, with a
//! scripted chat model and the offline mock embedder

use graphrag_config::{EmbeddingModelConfig, EmbeddingProviderType, ExtractionConfig};
use graphrag_core::test_support::ScriptedChat;
use graphrag_core::{
    EmbeddingResolver, GraphError, GraphRagService, GraphStore, GraphTransformer,
    InMemoryGraphBackend, Namespace, SourceDocument, StaticDirectory, Triple,
};
use graphrag_llm::{LlmGraphTransformer, ProviderFactory};
use std::sync::Arc;

const TEXT: &str = "Sam Altman is the CEO of OpenAI. OpenAI released GPT-4.";

const GRAPH_REPLY: &str = r#"Sure, here is the graph:
{
  "nodes": [
    {"id": "Sam Altman", "type": "PERSON", "description": "Chief executive of OpenAI"},
    {"id": "OpenAI", "type": "ORGANIZATION", "description": "AI research company"},
    {"id": "GPT-4", "type": "PRODUCT"}
  ],
  "relationships": [
    {"source": "Sam Altman", "source_type": "PERSON", "target": "OpenAI",
     "target_type": "ORGANIZATION", "type": "CEO of", "strength": 0.95},
    {"source": "OpenAI", "target": "GPT-4", "type": "released"}
  ]
}"#;

fn chat() -> Arc<ScriptedChat> {
    Arc::new(
        ScriptedChat::new()
            .with_rule("Extract the knowledge graph", GRAPH_REPLY)
            .with_rule("Extract the key entities", r#"["OpenAI"]"#)
            .with_rule("Facts:", "Sam Altman is the CEO of OpenAI."),
    )
}

fn service(chat: Arc<ScriptedChat>) -> GraphRagService {
    let mut model = EmbeddingModelConfig::new("offline", EmbeddingProviderType::Mock);
    model.dimensions = Some(64);
    let directory = Arc::new(StaticDirectory::new().with_default_model(model));
    let resolver = EmbeddingResolver::new(directory.clone(), directory, Arc::new(ProviderFactory));

    let store = GraphStore::new(Arc::new(InMemoryGraphBackend::new()));
    GraphRagService::new(store, Arc::new(resolver))
        .with_chat(chat)
        .with_extraction_config(&ExtractionConfig::default())
}

#[tokio::test]
async fn test_extracted_graph_answers_question() {
    let chat = chat();
    let service = service(chat.clone());
    let transformer = LlmGraphTransformer::new(chat.clone());
    let ns = Namespace::new("kb-llm").unwrap();

    let report = service
        .process_documents(&ns, &[SourceDocument::new(TEXT)], &transformer, true, true)
        .await;
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.nodes, 3);
    assert_eq!(report.edges, 2);

    let stats = service.statistics(&ns).await;
    assert_eq!(stats.nodes, 3);
    assert_eq!(stats.edges, 2);

    let answer = service
        .retrieve_with_answer_hybrid(&ns, "Who is the CEO of OpenAI?", None)
        .await;
    assert!(answer.found);
    assert_eq!(answer.answer, "Sam Altman is the CEO of OpenAI.");
    assert!(answer.triples.contains(&Triple::new("SAM ALTMAN", "CEO of", "OPENAI")));
}

#[tokio::test]
async fn test_unparseable_reply_fails_only_that_document() {
    let chat = Arc::new(
        ScriptedChat::new()
            .with_rule("Paris", "I'm sorry, I can't do that.")
            .with_rule("Extract the knowledge graph", GRAPH_REPLY),
    );
    let service = service(chat.clone());
    let transformer = LlmGraphTransformer::new(chat);
    let ns = Namespace::new("kb-partial").unwrap();

    let documents = [
        SourceDocument::new("Paris is the capital of France."),
        SourceDocument::new(TEXT),
    ];
    let report = service
        .process_documents(&ns, &documents, &transformer, true, false)
        .await;

    assert_eq!(report.documents, 2);
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].document_id, documents[0].id);
}

#[tokio::test]
async fn test_chat_failure_surfaces_as_provider_error() {
    let transformer = LlmGraphTransformer::new(Arc::new(ScriptedChat::failing()));
    let err = transformer
        .extract(&SourceDocument::new(TEXT))
        .await
        .unwrap_err();
    assert!(matches!(err, GraphError::Provider(_)));
}

#[tokio::test]
async fn test_blank_document_makes_no_call() {
    let chat = chat();
    let transformer = LlmGraphTransformer::new(chat.clone());
    let graph = transformer.extract(&SourceDocument::new("   ")).await.unwrap();
    assert!(graph.nodes.is_empty());
    assert_eq!(chat.call_count(), 0);
}
