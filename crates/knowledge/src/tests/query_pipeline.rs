use crate::embeddings::providers::MockProvider;
use crate::embeddings::EmbeddingProvider;
use crate::flat_index::BuildOptions;
use crate::manager::IndexManager;
use crate::rag::{QueryEngine, QueryOptions};
use crate::storage;
use crate::types::IndexOrigin;
use async_trait::async_trait;
use notes_core::{AppError, AppResult};
use notes_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage, MockLlmClient, OllamaClient};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// LLM client that records every request and replies with a fixed answer.
#[derive(Default)]
struct RecordingClient {
    requests: Mutex<Vec<LlmRequest>>,
}

impl RecordingClient {
    fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for RecordingClient {
    fn provider_name(&self) -> &str {
        "recording"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        let mut requests = self.requests.lock().unwrap();
        requests.push(request.clone());
        Ok(LlmResponse {
            content: format!("answer {}", requests.len()),
            model: request.model.clone(),
            usage: LlmUsage::default(),
        })
    }
}

/// Mock embedder that can be switched offline after the index is built.
#[derive(Debug)]
struct SwitchableEmbedder {
    inner: MockProvider,
    offline: AtomicBool,
}

#[async_trait]
impl EmbeddingProvider for SwitchableEmbedder {
    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "trigram-v1"
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(AppError::EmbeddingFailed("connection refused".to_string()));
        }
        self.inner.embed_batch(texts).await
    }
}

fn write_corpus(root: &Path) -> PathBuf {
    let corpus = root.join("data");
    fs::create_dir_all(&corpus).unwrap();
    fs::write(
        corpus.join("physics.txt"),
        "Water boils at 100 degrees Celsius at sea level.",
    )
    .unwrap();
    fs::write(
        corpus.join("sky.txt"),
        "The sky is blue because of Rayleigh scattering.",
    )
    .unwrap();
    corpus
}

fn manager_with(root: &Path, embedder: Arc<dyn EmbeddingProvider>) -> Arc<IndexManager> {
    Arc::new(IndexManager::new(
        root.join("data"),
        root.join("storage"),
        embedder,
        BuildOptions::default(),
    ))
}

fn mock_manager(root: &Path) -> Arc<IndexManager> {
    manager_with(root, Arc::new(MockProvider::new(384)))
}

fn engine(manager: Arc<IndexManager>, llm: Arc<dyn LlmClient>) -> QueryEngine {
    QueryEngine::new(manager, llm, QueryOptions::default())
}

#[tokio::test]
async fn test_answers_from_the_notes() {
    let temp = TempDir::new().unwrap();
    write_corpus(temp.path());

    let engine = engine(mock_manager(temp.path()), Arc::new(MockLlmClient::new()));
    let response = engine
        .ask("At what temperature does water boil?")
        .await
        .unwrap();

    assert!(response.answer.contains("100 degrees Celsius"));
    assert_eq!(response.sources.len(), 2);
    assert!(response.sources.iter().any(|s| s.source == "physics.txt"));
    assert!(storage::exists(&temp.path().join("storage")));
}

#[tokio::test]
async fn test_single_note_answers_boiling_point() {
    let temp = TempDir::new().unwrap();
    let corpus = temp.path().join("data");
    fs::create_dir_all(&corpus).unwrap();
    fs::write(
        corpus.join("notes.txt"),
        "The sky is blue. Water boils at 100 degrees Celsius at sea level.",
    )
    .unwrap();

    let engine = engine(mock_manager(temp.path()), Arc::new(MockLlmClient::new()));
    let question = "At what temperature does water boil?";

    let results = engine.retrieve(question).await.unwrap();
    assert!(results[0]
        .chunk
        .text
        .contains("Water boils at 100 degrees Celsius"));

    let answer = engine.answer(question).await.unwrap();
    assert!(answer.contains("100"));
    assert!(answer.contains("Celsius"));
}

#[tokio::test]
async fn test_prompt_carries_passages_and_settings() {
    let temp = TempDir::new().unwrap();
    write_corpus(temp.path());

    let llm = Arc::new(RecordingClient::default());
    let engine = engine(mock_manager(temp.path()), llm.clone());

    let answer = engine.answer("Why is the sky blue?").await.unwrap();
    assert_eq!(answer, "answer 1");

    let requests = llm.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert!(request.prompt.contains("Rayleigh scattering"));
    assert!(request.prompt.contains("Water boils at 100 degrees Celsius"));
    assert!(request.prompt.contains("Question: Why is the sky blue?"));
    assert_eq!(request.temperature, Some(0.2));
    assert!(request.system.is_some());
}

#[tokio::test]
async fn test_small_context_budget_refines_answer() {
    let temp = TempDir::new().unwrap();
    write_corpus(temp.path());

    let llm = Arc::new(RecordingClient::default());
    let options = QueryOptions {
        max_context_chars: 60,
        ..QueryOptions::default()
    };
    let engine = QueryEngine::new(mock_manager(temp.path()), llm.clone(), options);

    let answer = engine.answer("Why is the sky blue?").await.unwrap();

    let requests = llm.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].prompt.starts_with("Context information"));
    assert!(requests[1].prompt.contains("existing answer: answer 1"));
    assert_eq!(answer, "answer 2");
}

#[tokio::test]
async fn test_top_k_limits_sources() {
    let temp = TempDir::new().unwrap();
    write_corpus(temp.path());

    let engine = QueryEngine::new(
        mock_manager(temp.path()),
        Arc::new(MockLlmClient::new()),
        QueryOptions::default().with_top_k(1),
    );

    let results = engine.retrieve("sky blue scattering").await.unwrap();
    assert_eq!(results.len(), 1);
}

#[tokio::test]
async fn test_reloaded_index_gives_same_answer() {
    let temp = TempDir::new().unwrap();
    write_corpus(temp.path());
    let question = "At what temperature does water boil?";

    let first = engine(mock_manager(temp.path()), Arc::new(MockLlmClient::new()))
        .ask(question)
        .await
        .unwrap();

    let manager = mock_manager(temp.path());
    let second = engine(manager.clone(), Arc::new(MockLlmClient::new()))
        .ask(question)
        .await
        .unwrap();

    assert_eq!(manager.stats().await.unwrap().origin, IndexOrigin::Loaded);
    assert_eq!(first.answer, second.answer);
    assert_eq!(first.sources, second.sources);
}

#[tokio::test]
async fn test_empty_question_is_rejected_before_indexing() {
    let temp = TempDir::new().unwrap();
    let manager = mock_manager(temp.path());
    let engine = engine(manager.clone(), Arc::new(MockLlmClient::new()));

    let err = engine.answer("   ").await.unwrap_err();

    assert!(matches!(err, AppError::InvalidInput(_)));
    assert!(manager.current().await.is_none());
}

#[tokio::test]
async fn test_missing_corpus_is_reported() {
    let temp = TempDir::new().unwrap();
    let engine = engine(mock_manager(temp.path()), Arc::new(MockLlmClient::new()));

    let err = engine.answer("Anything?").await.unwrap_err();
    assert!(matches!(err, AppError::CorpusUnavailable(_)));
}

#[tokio::test]
async fn test_query_embedding_failure() {
    let temp = TempDir::new().unwrap();
    write_corpus(temp.path());

    let embedder = Arc::new(SwitchableEmbedder {
        inner: MockProvider::new(384),
        offline: AtomicBool::new(false),
    });
    let manager = manager_with(temp.path(), embedder.clone());
    manager.acquire(false).await.unwrap();

    embedder.offline.store(true, Ordering::SeqCst);
    let llm = Arc::new(RecordingClient::default());
    let err = engine(manager, llm.clone())
        .answer("Why is the sky blue?")
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::EmbeddingFailed(_)));
    assert!(llm.requests().is_empty());
}

#[tokio::test]
async fn test_generation_failure() {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let temp = TempDir::new().unwrap();
    write_corpus(temp.path());

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let llm = Arc::new(OllamaClient::with_base_url(server.uri()));
    let err = engine(mock_manager(temp.path()), llm)
        .answer("Why is the sky blue?")
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::GenerationUnavailable(_)));
}

#[tokio::test]
async fn test_force_rebuild_picks_up_new_notes() {
    let temp = TempDir::new().unwrap();
    let corpus = write_corpus(temp.path());
    let manager = mock_manager(temp.path());
    let engine = engine(manager.clone(), Arc::new(MockLlmClient::new()));

    engine.answer("Why is the sky blue?").await.unwrap();

    fs::write(
        corpus.join("chemistry.txt"),
        "Table salt dissolves readily in warm water.",
    )
    .unwrap();
    manager.acquire(true).await.unwrap();

    let results = engine.retrieve("salt dissolves").await.unwrap();
    assert_eq!(results.len(), 3);
    assert!(results.iter().any(|r| r.chunk.source_path == "chemistry.txt"));
}
