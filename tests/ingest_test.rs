//! Integration tests for the document store builder.

mod common;

use std::sync::Arc;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use common::{ingest, test_config, write_doc, FailingEmbedder, HashEmbedder, TextLoader};
use governance_assistant::error::IngestError;
use governance_assistant::ingest::{IngestOutcome, Ingestor};
use governance_assistant::retrieval::Retriever;

const POLICY_PAGES: &[&str] = &[
    "Data retention policy. Personal data is kept for five years after contract end.",
    "Access to customer data requires written approval from the data owner.",
];

#[tokio::test]
async fn test_empty_directory_is_empty_corpus_without_store_file() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    std::fs::create_dir_all(&config.ingest.documents_dir).unwrap();
    std::fs::write(config.ingest.documents_dir.join("readme.txt"), "not indexed").unwrap();

    let err = ingest(&config).await.unwrap_err();

    assert!(matches!(err, IngestError::EmptyCorpus { failures: 0, .. }));
    assert!(!config.store.path.exists(), "no store file may be created");
}

#[tokio::test]
async fn test_missing_directory_is_an_error() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());

    let err = ingest(&config).await.unwrap_err();
    assert!(matches!(err, IngestError::DocumentsDirMissing { .. }));
}

#[tokio::test]
async fn test_ingest_reports_pages_and_fragments() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    write_doc(&config, "policy.pdf", POLICY_PAGES);
    write_doc(&config, "data_charter.PDF", &["Stewards review data quality every quarter."]);

    let report = ingest(&config).await.unwrap();

    assert_eq!(report.files_found, 2);
    assert_eq!(report.files_loaded, 2);
    assert_eq!(report.pages_loaded, 3);
    assert_eq!(report.fragments_indexed, 3);
    assert_eq!(report.outcome(), IngestOutcome::Complete);
    assert!(config.store.path.exists());
}

#[tokio::test]
async fn test_reingestion_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    write_doc(&config, "policy.pdf", POLICY_PAGES);

    let first = ingest(&config).await.unwrap();
    let second = ingest(&config).await.unwrap();

    assert_eq!(first.fragments_indexed, second.fragments_indexed);
    assert_ne!(first.generation_id, second.generation_id);

    let retriever = Retriever::new(config.store.clone(), Arc::new(HashEmbedder::default()));
    let hits = retriever.retrieve("retention", 50).await.unwrap();
    assert_eq!(hits.len() as u64, second.fragments_indexed);
}

#[tokio::test]
async fn test_unreadable_file_makes_partial_outcome() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    write_doc(&config, "policy.pdf", POLICY_PAGES);
    write_doc(&config, "broken.pdf", &["CORRUPT bytes"]);

    let report = ingest(&config).await.unwrap();

    assert_eq!(report.outcome(), IngestOutcome::Partial);
    assert_eq!(report.files_found, 2);
    assert_eq!(report.files_loaded, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].filename, "broken.pdf");
}

#[tokio::test]
async fn test_only_unreadable_files_is_empty_corpus() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    write_doc(&config, "broken.pdf", &["CORRUPT bytes"]);

    let err = ingest(&config).await.unwrap_err();
    assert!(matches!(err, IngestError::EmptyCorpus { failures: 1, .. }));
    assert!(!config.store.path.exists());
}

#[tokio::test]
async fn test_blank_documents_are_empty_corpus() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    write_doc(&config, "blank.pdf", &["   ", "\n\n"]);

    let err = ingest(&config).await.unwrap_err();
    assert!(matches!(err, IngestError::EmptyCorpus { .. }));
    assert!(!config.store.path.exists());
}

#[tokio::test]
async fn test_empty_corpus_keeps_existing_store_serving() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    let doc = write_doc(&config, "policy.pdf", POLICY_PAGES);
    let report = ingest(&config).await.unwrap();

    std::fs::remove_file(doc).unwrap();
    let err = ingest(&config).await.unwrap_err();
    assert!(matches!(err, IngestError::EmptyCorpus { .. }));

    let retriever = Retriever::new(config.store.clone(), Arc::new(HashEmbedder::default()));
    let hits = retriever.retrieve("retention", 10).await.unwrap();
    assert_eq!(hits.len() as u64, report.fragments_indexed);
}

#[tokio::test]
async fn test_failed_rebuild_keeps_previous_generation() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    write_doc(&config, "policy.pdf", POLICY_PAGES);
    let report = ingest(&config).await.unwrap();

    write_doc(&config, "charter.pdf", &["A brand new charter page."]);
    let err = Ingestor::new(&config, Arc::new(FailingEmbedder))
        .with_loader(Arc::new(TextLoader))
        .run()
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::Embedding(_)));

    let retriever = Retriever::new(config.store.clone(), Arc::new(HashEmbedder::default()));
    let hits = retriever.retrieve("charter", 10).await.unwrap();
    assert_eq!(hits.len() as u64, report.fragments_indexed);
    assert!(hits.iter().all(|f| f.source == "Policy"));
}

#[tokio::test]
async fn test_fragments_carry_provenance() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    write_doc(&config, "data_governance_charter.pdf", &["Every dataset has a named data owner."]);
    ingest(&config).await.unwrap();

    let retriever = Retriever::new(config.store.clone(), Arc::new(HashEmbedder::default()));
    let hits = retriever.retrieve("data owner", 1).await.unwrap();

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].source, "Data Governance Charter");
    assert_eq!(hits[0].filename, "data_governance_charter.pdf");
    assert_eq!(hits[0].page, Some(0));
    assert_eq!(hits[0].start_index, 0);
    assert_eq!(hits[0].text, "Every dataset has a named data owner.");
}
