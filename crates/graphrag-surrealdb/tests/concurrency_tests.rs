//! Concurrent writers and cancelled retrievals sharing one embedded
//! SurrealDB backend

use graphrag_config::{EmbeddingModelConfig, EmbeddingProviderType};
use graphrag_core::test_support::{
    KeywordEmbedder, ScriptedChat, StaticEmbeddingFactory, StaticTransformer,
};
use graphrag_core::{
    EmbeddingProvider, EmbeddingResolver, GraphBackend, GraphDocument, GraphEdge, GraphNode,
    GraphRagService, GraphStore, GraphWriter, Namespace, SourceDocument, StaticDirectory, Triple,
};
use graphrag_surrealdb::SurrealGraphBackend;
use std::sync::Arc;
use std::time::Duration;

const DOCUMENTS: usize = 16;
const QUESTION: &str = "Who is the CEO of OpenAI?";

fn ns(id: &str) -> Namespace {
    Namespace::new(id).unwrap()
}

async fn backend() -> Arc<SurrealGraphBackend> {
    Arc::new(SurrealGraphBackend::memory().await.unwrap())
}

fn embedder() -> Arc<dyn EmbeddingProvider> {
    Arc::new(KeywordEmbedder::new())
}

fn service(backend: Arc<dyn GraphBackend>, chat: ScriptedChat) -> GraphRagService {
    let directory = Arc::new(StaticDirectory::new().with_default_model(
        EmbeddingModelConfig::new("keyword", EmbeddingProviderType::Mock),
    ));
    let resolver = EmbeddingResolver::new(
        directory.clone(),
        directory,
        Arc::new(StaticEmbeddingFactory::new(embedder())),
    );
    GraphRagService::new(GraphStore::new(backend), Arc::new(resolver)).with_chat(Arc::new(chat))
}

fn entity_chat() -> ScriptedChat {
    ScriptedChat::new().with_rule("Extract the key entities", r#"["OpenAI"]"#)
}

fn release_text(i: usize) -> String {
    format!("OpenAI released Product {i}; Sam Altman is CEO of OpenAI")
}

fn release_nodes(i: usize) -> Vec<GraphNode> {
    vec![
        GraphNode::new("OpenAI", "ORGANIZATION").with_description("AI research company"),
        GraphNode::new("Sam Altman", "PERSON").with_description("Chief executive"),
        GraphNode::new(format!("Product {i}"), "PRODUCT").with_description("Release"),
    ]
}

fn release_edges(i: usize) -> Vec<GraphEdge> {
    vec![
        GraphEdge::new("OpenAI", "released", format!("Product {i}")),
        GraphEdge::new("Sam Altman", "CEO of", "OpenAI"),
    ]
}

fn release_document(i: usize) -> GraphDocument {
    GraphDocument {
        nodes: release_nodes(i),
        edges: release_edges(i),
        source: SourceDocument::new(release_text(i)),
    }
}

fn release_transformer() -> StaticTransformer {
    (0..DOCUMENTS).fold(StaticTransformer::new(), |transformer, i| {
        transformer.with_document(release_text(i), release_nodes(i), release_edges(i))
    })
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_upserts_share_entities() {
    let backend = backend().await;
    let store = GraphStore::new(backend.clone());
    let kb = ns("kb");
    assert!(store.ensure_vector_index(&kb, Some(64)).await.unwrap());

    let handles: Vec<_> = (0..DOCUMENTS)
        .map(|i| {
            let writer = GraphWriter::new(store.clone());
            let embedder = embedder();
            let kb = kb.clone();
            tokio::spawn(async move {
                writer
                    .write(&kb, &release_document(i), Some(embedder.as_ref()), true)
                    .await
            })
        })
        .collect();
    for handle in handles {
        let summary = handle.await.unwrap().unwrap();
        assert_eq!(summary.nodes, 3);
        assert_eq!(summary.edges, 2);
    }

    let stats = backend.statistics(&kb).await.unwrap();
    assert_eq!(stats.documents, DOCUMENTS);
    assert_eq!(stats.nodes, DOCUMENTS + 2);
    assert_eq!(stats.edges, DOCUMENTS + 1);
    assert_eq!(stats.embedded_nodes, DOCUMENTS + 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_ingestion_through_service() {
    let backend = backend().await;
    let service = Arc::new(service(backend.clone(), entity_chat()));
    let transformer = Arc::new(release_transformer());
    let kb = ns("kb");

    let handles: Vec<_> = (0..DOCUMENTS)
        .map(|i| {
            let service = service.clone();
            let transformer = transformer.clone();
            let kb = kb.clone();
            tokio::spawn(async move {
                service
                    .process_documents(
                        &kb,
                        &[SourceDocument::new(release_text(i))],
                        transformer.as_ref(),
                        true,
                        true,
                    )
                    .await
            })
        })
        .collect();
    for handle in handles {
        let report = handle.await.unwrap();
        assert_eq!(report.succeeded, 1, "ingestion failed: {:?}", report.failures);
    }

    let stats = backend.statistics(&kb).await.unwrap();
    assert_eq!(stats.documents, DOCUMENTS);
    assert_eq!(stats.nodes, DOCUMENTS + 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_ensure_vector_index() {
    let backend = backend().await;
    let store = GraphStore::new(backend.clone());
    let kb = ns("kb");

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = store.clone();
            let kb = kb.clone();
            tokio::spawn(async move { store.ensure_vector_index(&kb, Some(64)).await })
        })
        .collect();
    for handle in handles {
        assert!(handle.await.unwrap().unwrap());
    }
    assert!(backend.vector_index_ready(&kb).await.unwrap());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_dropped_retrieval_leaves_graph_usable() {
    let backend = backend().await;
    let kb = ns("kb");
    let report = service(backend.clone(), entity_chat())
        .process_documents(
            &kb,
            &[SourceDocument::new(release_text(0))],
            &release_transformer(),
            true,
            true,
        )
        .await;
    assert_eq!(report.succeeded, 1);

    let stalled = Arc::new(service(
        backend.clone(),
        entity_chat().with_delay(Duration::from_secs(60)),
    ));

    let timed_out = tokio::time::timeout(
        Duration::from_millis(200),
        stalled.retrieve_hybrid(&kb, QUESTION, None),
    )
    .await;
    assert!(timed_out.is_err());

    let task = {
        let stalled = stalled.clone();
        let kb = kb.clone();
        tokio::spawn(async move { stalled.retrieve_hybrid(&kb, QUESTION, None).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    task.abort();
    assert!(task.await.unwrap_err().is_cancelled());

    // A cancelled task must not leave the write gate held
    let fresh = service(backend.clone(), entity_chat());
    let report = fresh
        .process_documents(
            &kb,
            &[SourceDocument::new(release_text(1))],
            &release_transformer(),
            true,
            true,
        )
        .await;
    assert_eq!(report.succeeded, 1);
    let triples = fresh.retrieve_hybrid(&kb, QUESTION, None).await;
    assert!(
        triples.contains(&Triple::new("SAM ALTMAN", "CEO of", "OPENAI")),
        "got {:?}",
        triples
    );
    assert_eq!(backend.statistics(&kb).await.unwrap().documents, 2);
}
