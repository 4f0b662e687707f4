//! Write-path tests: batching, ids, metadata and partial failure.

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use common::{HashEmbedder, PoisonEmbedder, ScriptedStore};
use rag_context::document::TEXT_KEY;
use rag_context::{
    Document, InMemoryVectorStore, IngestionPipeline, IngestionSummary, RagConfig, RagError,
    VectorStore,
};
use serde_json::json;

fn documents(n: usize) -> Vec<Document> {
    (0..n).map(|i| Document::new(format!("coaching note {i}"))).collect()
}

fn config(batch_size: usize) -> RagConfig {
    RagConfig::builder().ingest_batch_size(batch_size).build().unwrap()
}

#[tokio::test]
async fn ingests_in_fixed_size_batches_with_final_partial_batch() {
    let store = Arc::new(ScriptedStore::default());
    let embedder = Arc::new(HashEmbedder::default());
    let pipeline = IngestionPipeline::new(&config(100), embedder.clone(), store.clone()).unwrap();

    let summary = pipeline.ingest(&documents(250)).await.unwrap();

    assert_eq!(summary, IngestionSummary { documents: 250, batches: 3 });
    assert_eq!(store.upsert_sizes(), [100, 100, 50]);
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 250);
}

#[tokio::test]
async fn derives_sequential_ids_across_batches() {
    let store = Arc::new(ScriptedStore::default());
    let pipeline =
        IngestionPipeline::new(&config(2), Arc::new(HashEmbedder::default()), store.clone())
            .unwrap();

    let mut docs = documents(5);
    docs[3] = docs[3].clone().with_id("faq-pinned");
    pipeline.ingest(&docs).await.unwrap();

    let upserts = store.upserts.lock().unwrap();
    let ids: Vec<&str> = upserts.iter().flatten().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["doc_0", "doc_1", "doc_2", "faq-pinned", "doc_4"]);
}

#[tokio::test]
async fn records_carry_text_and_metadata() {
    let store = Arc::new(ScriptedStore::default());
    let pipeline =
        IngestionPipeline::new(&config(10), Arc::new(HashEmbedder::default()), store.clone())
            .unwrap();

    let doc = Document::new("Practice the STAR method.")
        .with_metadata("source", "workshop-3")
        .with_metadata("page", 12);
    pipeline.ingest(&[doc]).await.unwrap();

    let upserts = store.upserts.lock().unwrap();
    let record = &upserts[0][0];
    assert_eq!(record.values.len(), common::DIM);
    assert_eq!(record.metadata.get(TEXT_KEY), Some(&json!("Practice the STAR method.")));
    assert_eq!(record.metadata.get("source"), Some(&json!("workshop-3")));
    assert_eq!(record.metadata.get("page"), Some(&json!(12)));
}

#[tokio::test]
async fn empty_input_makes_no_calls() {
    let store = Arc::new(ScriptedStore::default());
    let pipeline =
        IngestionPipeline::new(&config(100), Arc::new(HashEmbedder::default()), store.clone())
            .unwrap();
    let summary = pipeline.ingest(&[]).await.unwrap();
    assert_eq!(summary, IngestionSummary::default());
    assert!(store.upsert_sizes().is_empty());
}

#[tokio::test]
async fn upsert_failure_aborts_without_rolling_back() {
    let store = Arc::new(ScriptedStore { fail_upsert_at: Some(1), ..ScriptedStore::default() });
    let pipeline =
        IngestionPipeline::new(&config(100), Arc::new(HashEmbedder::default()), store.clone())
            .unwrap();

    let err = pipeline.ingest(&documents(250)).await.unwrap_err();

    match err {
        RagError::IngestionError { batch, upserted, message } => {
            assert_eq!(batch, 1);
            assert_eq!(upserted, 100);
            assert!(message.contains("index unavailable"));
        }
        other => panic!("unexpected error: {other}"),
    }
    // the first batch stays in the store; the third is never attempted
    assert_eq!(store.upsert_sizes(), [100]);
}

#[tokio::test]
async fn embedding_failure_aborts_batch_before_upsert() {
    let store = Arc::new(ScriptedStore::default());
    let pipeline = IngestionPipeline::new(
        &config(3),
        Arc::new(PoisonEmbedder { poison: "note 4" }),
        store.clone(),
    )
    .unwrap();

    let err = pipeline.ingest(&documents(6)).await.unwrap_err();
    assert!(matches!(err, RagError::IngestionError { batch: 1, upserted: 3, .. }));
    assert_eq!(store.upsert_sizes(), [3]);
}

#[tokio::test]
async fn rerunning_ingestion_is_idempotent() {
    let store = Arc::new(InMemoryVectorStore::new());
    let config = config(4);
    let pipeline =
        IngestionPipeline::new(&config, Arc::new(HashEmbedder::default()), store.clone()).unwrap();

    pipeline.ingest(&documents(10)).await.unwrap();
    pipeline.ingest(&documents(10)).await.unwrap();

    assert_eq!(store.len(&config.namespace).await, 10);
    let matches = store.search(&config.namespace, &[1.0; common::DIM], 20).await.unwrap();
    assert_eq!(matches.len(), 10);
}

#[test]
fn zero_batch_size_is_rejected() {
    let mut config = RagConfig::default();
    config.ingest_batch_size = 0;
    let result = IngestionPipeline::new(
        &config,
        Arc::new(HashEmbedder::default()),
        Arc::new(ScriptedStore::default()),
    );
    assert!(matches!(result, Err(RagError::ConfigError(_))));
}
