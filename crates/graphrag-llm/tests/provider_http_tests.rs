//! HTTP providers against a wiremock server

use graphrag_config::{ChatConfig, EmbeddingModelConfig, EmbeddingProviderType, LlmProviderType};
use graphrag_core::{ChatProvider, ChatRequest, EmbeddingProvider, LlmError};
use graphrag_llm::{
    create_chat_provider, create_provider, OllamaChatProvider, OllamaEmbeddingProvider,
    OpenAIChatProvider, OpenAIEmbeddingProvider,
};
use serde_json::json;
use serial_test::serial;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Ollama
// ============================================================================

#[tokio::test]
async fn test_ollama_embed_batch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .and(body_partial_json(json!({
            "model": "nomic-embed-text",
            "input": ["first", "second"],
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "nomic-embed-text",
            "embeddings": [[0.1, 0.2, 0.3], [0.4, 0.5, 0.6]],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = OllamaEmbeddingProvider::new(server.uri(), "nomic-embed-text", 3);
    let responses = provider
        .embed_batch(vec!["first".to_string(), "second".to_string()])
        .await
        .unwrap();

    assert_eq!(responses.len(), 2);
    assert_eq!(responses[1].embedding, vec![0.4, 0.5, 0.6]);
    assert_eq!(responses[0].model, "nomic-embed-text");
}

#[tokio::test]
async fn test_ollama_embed_single_reports_tokens() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "embeddings": [[1.0, 0.0]],
            "prompt_eval_count": 4,
        })))
        .mount(&server)
        .await;

    let provider = OllamaEmbeddingProvider::new(server.uri(), "tiny", 2);
    let response = provider.embed("who runs OpenAI").await.unwrap();
    assert_eq!(response.dimensions, 2);
    assert_eq!(response.tokens, Some(4));
}

#[tokio::test]
async fn test_ollama_dimension_mismatch_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "embeddings": [[1.0, 0.0, 0.0]],
        })))
        .mount(&server)
        .await;

    let provider = OllamaEmbeddingProvider::new(server.uri(), "tiny", 2);
    let err = provider.embed("text").await.unwrap_err();
    assert!(matches!(err, LlmError::InvalidResponse(_)), "{err}");
}

#[tokio::test]
async fn test_ollama_server_error_is_transient() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(503).set_body_string(r#"{"error": "loading model"}"#))
        .mount(&server)
        .await;

    let provider = OllamaEmbeddingProvider::new(server.uri(), "nomic-embed-text", 768);
    let err = provider.embed("text").await.unwrap_err();
    assert!(matches!(err, LlmError::Unavailable(_)));
    assert!(err.is_transient());
    assert!(err.to_string().contains("loading model"));
}

#[tokio::test]
async fn test_ollama_chat() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({
            "model": "llama3.1",
            "stream": false,
            "messages": [{"role": "user", "content": "Who runs OpenAI?"}],
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "llama3.1",
            "message": {"role": "assistant", "content": "[\"OpenAI\"]"},
            "done": true,
            "eval_count": 5,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = OllamaChatProvider::new(server.uri(), "llama3.1".to_string(), 60);
    let reply = provider.chat(ChatRequest::prompt("Who runs OpenAI?")).await.unwrap();
    assert_eq!(reply, "[\"OpenAI\"]");
}

#[tokio::test]
async fn test_ollama_chat_model_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(404).set_body_string(r#"{"error": "model 'nonexistent' not found"}"#),
        )
        .mount(&server)
        .await;

    let provider = OllamaChatProvider::new(server.uri(), "nonexistent".to_string(), 60);
    let err = provider.chat(ChatRequest::prompt("hi")).await.unwrap_err();
    assert!(matches!(err, LlmError::InvalidResponse(_)));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn test_ollama_chat_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"message": {"content": "late"}}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let provider = OllamaChatProvider::new(server.uri(), "llama3.1".to_string(), 1);
    let err = provider.chat(ChatRequest::prompt("hi")).await.unwrap_err();
    assert!(matches!(err, LlmError::Timeout(1)), "{err}");
}

// ============================================================================
// OpenAI
// ============================================================================

#[tokio::test]
async fn test_openai_embeddings_sorted_by_index() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": [
                {"object": "embedding", "index": 1, "embedding": [0.0, 1.0]},
                {"object": "embedding", "index": 0, "embedding": [1.0, 0.0]},
            ],
            "model": "text-embedding-3-small",
            "usage": {"prompt_tokens": 6, "total_tokens": 6},
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = OpenAIEmbeddingProvider::new(
        Some("sk-test".to_string()),
        server.uri(),
        "text-embedding-3-small",
        2,
    );
    let responses = provider
        .embed_batch(vec!["a".to_string(), "b".to_string()])
        .await
        .unwrap();
    assert_eq!(responses[0].embedding, vec![1.0, 0.0]);
    assert_eq!(responses[1].embedding, vec![0.0, 1.0]);
}

#[tokio::test]
async fn test_openai_unauthorized_is_config_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;

    let provider = OpenAIEmbeddingProvider::new(Some("bad".to_string()), server.uri(), "m", 2);
    let err = provider.embed("x").await.unwrap_err();
    assert!(matches!(err, LlmError::ConfigError(_)));
}

#[tokio::test]
async fn test_openai_chat() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({"model": "gpt-4o-mini", "temperature": 0.0})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-1",
            "model": "gpt-4o-mini",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Sam Altman is the CEO of OpenAI."},
                "finish_reason": "stop",
            }],
            "usage": {"prompt_tokens": 20, "completion_tokens": 9, "total_tokens": 29},
        })))
        .mount(&server)
        .await;

    let provider = OpenAIChatProvider::new(
        Some("sk-test".to_string()),
        Some(server.uri()),
        "gpt-4o-mini".to_string(),
        60,
    )
    .with_defaults(Some(0.0), None);
    let reply = provider.chat(ChatRequest::prompt("Who is the CEO?")).await.unwrap();
    assert_eq!(reply, "Sam Altman is the CEO of OpenAI.");
}

#[tokio::test]
async fn test_openai_chat_without_choices() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let provider = OpenAIChatProvider::new(None, Some(server.uri()), "m".to_string(), 60);
    let err = provider.chat(ChatRequest::prompt("hi")).await.unwrap_err();
    assert!(matches!(err, LlmError::InvalidResponse(_)));
}

// ============================================================================
// Factories
// ============================================================================

#[tokio::test]
async fn test_factory_built_providers_hit_configured_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"index": 0, "embedding": [0.5, 0.5, 0.5, 0.5]}],
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "ok"}}],
        })))
        .mount(&server)
        .await;

    let mut model = EmbeddingModelConfig::new("bge", EmbeddingProviderType::OpenAI);
    model.api_url = Some(format!("{}/v1", server.uri()));
    model.dimensions = Some(4);
    model.api_key_env = Some("GRAPHRAG_TEST_UNSET_KEY".to_string());
    let embedder = create_provider(&model).unwrap();
    assert_eq!(embedder.embed("text").await.unwrap().dimensions, 4);

    let chat = create_chat_provider(&ChatConfig {
        provider: LlmProviderType::OpenAI,
        endpoint: Some(format!("{}/v1", server.uri())),
        api_key_env: Some("GRAPHRAG_TEST_UNSET_KEY".to_string()),
        ..Default::default()
    })
    .unwrap();
    assert_eq!(chat.chat(ChatRequest::prompt("ping")).await.unwrap(), "ok");
}

#[test]
#[serial]
fn test_official_openai_endpoint_requires_key() {
    std::env::remove_var("OPENAI_API_KEY");

    let model = EmbeddingModelConfig::new("cloud", EmbeddingProviderType::OpenAI);
    assert!(matches!(create_provider(&model), Err(LlmError::ConfigError(_))));

    let chat = ChatConfig {
        provider: LlmProviderType::OpenAI,
        ..Default::default()
    };
    assert!(matches!(create_chat_provider(&chat), Err(LlmError::ConfigError(_))));
}

#[test]
#[serial]
fn test_official_openai_endpoint_reads_key_from_env() {
    std::env::set_var("GRAPHRAG_TEST_OPENAI_KEY", "sk-from-env");

    let mut model = EmbeddingModelConfig::new("cloud", EmbeddingProviderType::OpenAI);
    model.api_key_env = Some("GRAPHRAG_TEST_OPENAI_KEY".to_string());
    let provider = create_provider(&model).unwrap();
    assert_eq!(provider.dimensions(), 1536);

    std::env::remove_var("GRAPHRAG_TEST_OPENAI_KEY");
}
