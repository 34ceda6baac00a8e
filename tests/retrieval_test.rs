//! Integration tests for the retriever.

mod common;

use std::sync::Arc;

use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use common::{ingest, test_config, write_doc, FixedEmbedder, HashEmbedder, DIM};
use governance_assistant::error::RetrievalError;
use governance_assistant::retrieval::Retriever;

async fn indexed_config(dir: &TempDir) -> governance_assistant::Config {
    let config = test_config(dir.path());
    write_doc(
        &config,
        "policy.pdf",
        &[
            "Personal data retention is limited to five years.",
            "The data owner approves every access request.",
            "Quarterly quality reviews are run by data stewards.",
        ],
    );
    write_doc(&config, "ai_act.pdf", &["High-risk AI systems need a conformity assessment."]);
    ingest(&config).await.unwrap();
    config
}

#[tokio::test]
async fn test_missing_store_is_unavailable_and_not_created() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    let embedder = Arc::new(HashEmbedder::default());
    let retriever = Retriever::new(config.store.clone(), embedder.clone());

    let err = retriever.retrieve("anything", 3).await.unwrap_err();

    assert!(matches!(err, RetrievalError::StoreUnavailable { .. }));
    assert!(!config.store.path.exists());
    assert_eq!(embedder.calls(), 0, "no embedding call without a store");
}

#[tokio::test]
async fn test_zero_depth_is_rejected() {
    let dir = TempDir::new().unwrap();
    let config = indexed_config(&dir).await;
    let retriever = Retriever::new(config.store.clone(), Arc::new(HashEmbedder::default()));

    let err = retriever.retrieve("retention", 0).await.unwrap_err();
    assert!(matches!(err, RetrievalError::InvalidDepth));
}

#[tokio::test]
async fn test_never_more_than_k() {
    let dir = TempDir::new().unwrap();
    let config = indexed_config(&dir).await;
    let retriever = Retriever::new(config.store.clone(), Arc::new(HashEmbedder::default()));

    for k in 1..=6 {
        let hits = retriever.retrieve("data", k).await.unwrap();
        assert!(hits.len() <= k);
        assert_eq!(hits.len(), k.min(4));
    }
}

#[tokio::test]
async fn test_best_match_ranks_first() {
    let dir = TempDir::new().unwrap();
    let config = indexed_config(&dir).await;
    let retriever = Retriever::new(config.store.clone(), Arc::new(HashEmbedder::default()));

    let hits = retriever
        .search_scored("conformity assessment for high-risk AI systems", 4)
        .await
        .unwrap();

    assert_eq!(hits[0].fragment.source, "Ai Act");
    for pair in hits.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[tokio::test]
async fn test_results_come_from_the_store() {
    let dir = TempDir::new().unwrap();
    let config = indexed_config(&dir).await;
    let retriever = Retriever::new(config.store.clone(), Arc::new(HashEmbedder::default()));

    let known = [
        "Personal data retention is limited to five years.",
        "The data owner approves every access request.",
        "Quarterly quality reviews are run by data stewards.",
        "High-risk AI systems need a conformity assessment.",
    ];
    for hit in retriever.retrieve("who approves access?", 4).await.unwrap() {
        assert!(known.contains(&hit.text.as_str()), "unknown fragment {:?}", hit.text);
    }
}

#[tokio::test]
async fn test_similarity_threshold_filters_hits() {
    let dir = TempDir::new().unwrap();
    let config = indexed_config(&dir).await;

    let unfiltered = Retriever::new(config.store.clone(), Arc::new(HashEmbedder::default()));
    assert_eq!(unfiltered.retrieve("unrelated words", 4).await.unwrap().len(), 4);

    let filtered = Retriever::new(config.store.clone(), Arc::new(HashEmbedder::default()))
        .with_similarity_threshold(Some(0.99));
    assert!(filtered.retrieve("unrelated words", 4).await.unwrap().is_empty());

    let exact = filtered
        .retrieve("The data owner approves every access request.", 4)
        .await
        .unwrap();
    assert_eq!(exact.len(), 1);
    assert_eq!(exact[0].page, Some(1));
}

#[tokio::test]
async fn test_cancelled_retrieval() {
    let dir = TempDir::new().unwrap();
    let config = indexed_config(&dir).await;
    let retriever = Retriever::new(config.store.clone(), Arc::new(HashEmbedder::default()));

    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = retriever
        .retrieve_cancellable("retention", 3, &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, RetrievalError::Cancelled));
}

#[tokio::test]
async fn test_other_embedding_model_is_rejected_before_embedding() {
    let dir = TempDir::new().unwrap();
    let config = indexed_config(&dir).await;
    let embedder = Arc::new(FixedEmbedder::new("other-embed", 32));
    let retriever = Retriever::new(config.store.clone(), embedder.clone());

    let err = retriever.retrieve("retention", 3).await.unwrap_err();

    match err {
        RetrievalError::EmbeddingModelMismatch {
            store_model,
            query_model,
        } => {
            assert_eq!(store_model, "hash-embed");
            assert_eq!(query_model, "other-embed");
        }
        other => panic!("expected EmbeddingModelMismatch, got {:?}", other),
    }
    assert_eq!(embedder.calls(), 0);
}

#[tokio::test]
async fn test_query_dimension_mismatch_is_an_error() {
    let dir = TempDir::new().unwrap();
    let config = indexed_config(&dir).await;
    // Same model name as the store, different vector size.
    let retriever = Retriever::new(
        config.store.clone(),
        Arc::new(FixedEmbedder::new("hash-embed", 32)),
    );

    let err = retriever.retrieve("retention", 3).await.unwrap_err();

    match err {
        RetrievalError::DimensionMismatch { stored, query } => {
            assert_eq!(stored, DIM);
            assert_eq!(query, 32);
        }
        other => panic!("expected DimensionMismatch, got {:?}", other),
    }
}
