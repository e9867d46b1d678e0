//! End-to-end tests for a chat session with in-process providers.
//!
//! The fake embedder maps text onto keyword counts so similarity is
//! predictable; the fake completion echoes the prompt it received.

use anyhow::Result;
use async_trait::async_trait;
use context_chat::chat::ChatSession;
use context_chat::completion::CompletionProvider;
use context_chat::config::IngestConfig;
use context_chat::ingest::ingest_paths;
use context_chat::table::{export_table, import_table};
use context_chat_core::embedding::EmbeddingProvider;
use context_chat_core::retrieval::{RetrievalOutcome, Retriever};
use context_chat_core::store::EmbeddingStore;
use context_chat_core::Error;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

const VOCAB: [&str; 4] = ["cat", "dog", "fish", "sleep"];

/// Embeds text as counts of the vocabulary words, plus a small bias so
/// no vector is all zeros.
#[derive(Default)]
struct KeywordEmbedder {
    calls: AtomicUsize,
    fail: bool,
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    fn model_name(&self) -> &str {
        "keyword"
    }
    fn dims(&self) -> Option<usize> {
        Some(VOCAB.len() + 1)
    }
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            anyhow::bail!("429 Too Many Requests");
        }
        Ok(texts
            .iter()
            .map(|t| {
                let lower = t.to_lowercase();
                let mut v: Vec<f32> = VOCAB
                    .iter()
                    .map(|w| lower.matches(w).count() as f32)
                    .collect();
                v.push(0.1);
                v
            })
            .collect())
    }
}

/// Replies with the prompt it was given.
struct EchoCompletion;

#[async_trait]
impl CompletionProvider for EchoCompletion {
    fn model_name(&self) -> &str {
        "echo"
    }
    async fn complete(&self, prompt: &str) -> Result<String> {
        Ok(format!("echo: {}", prompt))
    }
}

struct FailingCompletion;

#[async_trait]
impl CompletionProvider for FailingCompletion {
    fn model_name(&self) -> &str {
        "failing"
    }
    async fn complete(&self, _prompt: &str) -> Result<String> {
        anyhow::bail!("OpenAI API error 401 Unauthorized")
    }
}

fn write_docs() -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("cats.txt"),
        "The cat likes to sleep.\nA cat can sleep all day.",
    )
    .unwrap();
    fs::write(tmp.path().join("dogs.md"), "The dog fetches.\nEvery dog barks.").unwrap();
    fs::write(tmp.path().join("fish.txt"), "A fish swims.").unwrap();
    tmp
}

#[tokio::test]
async fn test_first_question_without_context_is_not_augmented() {
    let embedder = Arc::new(KeywordEmbedder::default());
    let session = ChatSession::new(
        Retriever::new(EmbeddingStore::new(), embedder.clone()),
        Arc::new(EchoCompletion),
    );

    let turn = session.ask("hello").await.unwrap();
    assert_eq!(turn.outcome, RetrievalOutcome::NoContext);
    assert_eq!(turn.prompt, "hello");
    assert_eq!(turn.reply, "echo: hello");
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_ingested_documents_ground_the_prompt() {
    let docs = write_docs();
    let embedder = Arc::new(KeywordEmbedder::default());

    let mut store = EmbeddingStore::new();
    let report = ingest_paths(
        &[docs.path().to_path_buf()],
        &IngestConfig::default(),
        embedder.as_ref(),
        2,
        &mut store,
    )
    .await
    .unwrap();
    assert_eq!(report.files, 3);
    assert_eq!(report.loaded, 3);
    assert_eq!(report.skipped, 0);
    // Three documents in batches of two.
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 2);

    let session = ChatSession::new(Retriever::new(store, embedder), Arc::new(EchoCompletion));
    let turn = session.ask("what does a cat do?").await.unwrap();

    assert_eq!(
        turn.prompt,
        "Info: The cat likes to sleep. A cat can sleep all day.\nQuestion: what does a cat do?\nAnswer:"
    );
    assert!(turn.reply.starts_with("echo: Info: The cat"));
}

#[tokio::test]
async fn test_table_round_trip_preserves_answers() {
    let docs = write_docs();
    let embedder = Arc::new(KeywordEmbedder::default());

    let mut store = EmbeddingStore::new();
    ingest_paths(
        &[docs.path().to_path_buf()],
        &IngestConfig::default(),
        embedder.as_ref(),
        64,
        &mut store,
    )
    .await
    .unwrap();

    let out = TempDir::new().unwrap();
    let table = out.path().join("ChatData.json");
    assert_eq!(export_table(&table, &store).unwrap(), 3);

    let mut reloaded = EmbeddingStore::new();
    assert_eq!(import_table(&table, &mut reloaded).unwrap(), 3);
    assert_eq!(reloaded.dims(), store.dims());
    for entry in store.entries() {
        let other = reloaded.get(&entry.text).unwrap();
        assert_eq!(other.len(), entry.vector.len());
        for (a, b) in entry.vector.iter().zip(other) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    let before = Retriever::new(store, embedder.clone());
    let after = Retriever::new(reloaded, embedder);
    for q in ["dog tricks", "fish", "sleepy cat"] {
        assert_eq!(before.query(q).await.unwrap(), after.query(q).await.unwrap());
    }
}

#[tokio::test]
async fn test_min_score_keeps_weak_matches_out_of_the_prompt() {
    let embedder = Arc::new(KeywordEmbedder::default());
    let mut store = EmbeddingStore::new();
    store
        .insert("A fish swims.", vec![0.0, 0.0, 1.0, 0.0, 0.1])
        .unwrap();

    let retriever = Retriever::new(store, embedder).with_min_score(Some(0.5));
    let session = ChatSession::new(retriever, Arc::new(EchoCompletion));

    let turn = session.ask("tell me about a dog").await.unwrap();
    assert_eq!(turn.outcome, RetrievalOutcome::NoContext);
    assert_eq!(turn.prompt, "tell me about a dog");

    let turn = session.ask("fish").await.unwrap();
    assert!(turn.outcome.is_match());
}

#[tokio::test]
async fn test_service_errors_are_surfaced() {
    let mut store = EmbeddingStore::new();
    store.insert("anything", vec![1.0, 0.0, 0.0, 0.0, 0.1]).unwrap();

    let failing_embedder = Arc::new(KeywordEmbedder {
        fail: true,
        ..Default::default()
    });
    let session = ChatSession::new(
        Retriever::new(store.clone(), failing_embedder),
        Arc::new(EchoCompletion),
    );
    let err = session.ask("cat").await.unwrap_err();
    match err.downcast_ref::<Error>() {
        Some(Error::EmbeddingService(msg)) => assert!(msg.contains("429")),
        other => panic!("expected embedding service error, got {:?}", other),
    }

    let session = ChatSession::new(
        Retriever::new(store, Arc::new(KeywordEmbedder::default())),
        Arc::new(FailingCompletion),
    );
    let err = session.ask("cat").await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<Error>(),
        Some(Error::CompletionService(_))
    ));
}

#[tokio::test]
async fn test_blank_question_is_rejected() {
    let embedder = Arc::new(KeywordEmbedder::default());
    let mut store = EmbeddingStore::new();
    store.insert("x", vec![1.0, 0.0, 0.0, 0.0, 0.1]).unwrap();
    let session = ChatSession::new(Retriever::new(store, embedder.clone()), Arc::new(EchoCompletion));

    assert!(session.ask("   ").await.is_err());
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_documents_added_mid_session_ground_the_next_question() {
    let docs = write_docs();
    let embedder = Arc::new(KeywordEmbedder::default());
    let mut session = ChatSession::new(
        Retriever::new(EmbeddingStore::new(), embedder.clone()),
        Arc::new(EchoCompletion),
    );

    let turn = session.ask("what does a cat do?").await.unwrap();
    assert_eq!(turn.outcome, RetrievalOutcome::NoContext);

    let report = session
        .add_documents(
            &[docs.path().join("fish.txt")],
            &IngestConfig::default(),
            64,
        )
        .await
        .unwrap();
    assert_eq!(report.loaded, 1);

    let report = session
        .add_documents(
            &[docs.path().join("cats.txt")],
            &IngestConfig::default(),
            64,
        )
        .await
        .unwrap();
    assert_eq!(report.loaded, 1);
    assert_eq!(session.store().len(), 2);

    let turn = session.ask("what does a cat do?").await.unwrap();
    assert_eq!(
        turn.prompt,
        "Info: The cat likes to sleep. A cat can sleep all day.\nQuestion: what does a cat do?\nAnswer:"
    );
}
