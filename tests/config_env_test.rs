//! Config environment variable tests
//!
//! These tests verify that Config::from_env() reads environment overrides
//! and falls back to defaults. Tests use #[serial] to prevent race conditions
//! with shared env vars.

use governance_assistant::config::{Config, LogFormat};
use governance_assistant::error::AppError;
use serial_test::serial;
use std::env;
use std::path::Path;

const VARS: &[&str] = &[
    "OPENAI_API_KEY",
    "OPENAI_BASE_URL",
    "CHAT_MODEL",
    "EMBEDDING_MODEL",
    "DOCUMENTS_DIR",
    "VECTOR_STORE_PATH",
    "VECTOR_COLLECTION",
    "CHUNK_SIZE",
    "CHUNK_OVERLAP",
    "EMBEDDING_BATCH_SIZE",
    "TOP_K_RESULTS",
    "SIMILARITY_THRESHOLD",
    "MAX_RETRIES",
    "LOG_FORMAT",
];

fn clear_env() {
    for var in VARS {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_defaults() {
    clear_env();

    let config = Config::from_env().unwrap();
    assert_eq!(config.openai.base_url, "https://api.openai.com/v1");
    assert_eq!(config.models.chat, "gpt-5.1");
    assert_eq!(config.models.embedding, "text-embedding-3-large");
    assert_eq!(config.store.path, Path::new("./data/vector_store.db"));
    assert_eq!(config.store.collection, "data_governance_rag");
    assert_eq!(config.ingest.documents_dir, Path::new("./data/documents"));
    assert_eq!(config.ingest.chunk_size, 1000);
    assert_eq!(config.ingest.chunk_overlap, 150);
    assert_eq!(config.ingest.embedding_batch_size, 64);
    assert_eq!(config.retrieval.top_k, 6);
    assert_eq!(config.retrieval.similarity_threshold, None);
    assert_eq!(config.request.max_retries, 2);
    assert_eq!(config.logging.format, LogFormat::Pretty);
}

#[test]
#[serial]
fn test_missing_key_is_reported_not_fatal() {
    clear_env();

    let config = Config::from_env().unwrap();
    assert!(config.openai.api_key.is_none());
    assert!(matches!(
        config.missing_credentials(),
        Some(AppError::ConfigurationMissing { .. })
    ));

    env::set_var("OPENAI_API_KEY", "sk-test");
    let config = Config::from_env().unwrap();
    assert!(config.missing_credentials().is_none());
    clear_env();
}

#[test]
#[serial]
fn test_overrides() {
    clear_env();
    env::set_var("OPENAI_BASE_URL", "http://localhost:8080/v1");
    env::set_var("CHAT_MODEL", "gpt-4o-mini");
    env::set_var("VECTOR_STORE_PATH", "/tmp/custom.db");
    env::set_var("CHUNK_SIZE", "500");
    env::set_var("CHUNK_OVERLAP", "50");
    env::set_var("SIMILARITY_THRESHOLD", "0.35");
    env::set_var("MAX_RETRIES", "0");
    env::set_var("LOG_FORMAT", "JSON");

    let config = Config::from_env().unwrap();
    assert_eq!(config.openai.base_url, "http://localhost:8080/v1");
    assert_eq!(config.models.chat, "gpt-4o-mini");
    assert_eq!(config.store.path, Path::new("/tmp/custom.db"));
    assert_eq!(config.ingest.chunk_size, 500);
    assert_eq!(config.ingest.chunk_overlap, 50);
    assert_eq!(config.retrieval.similarity_threshold, Some(0.35));
    assert_eq!(config.request.max_retries, 0);
    assert_eq!(config.logging.format, LogFormat::Json);

    clear_env();
}

#[test]
#[serial]
fn test_unparseable_numbers_fall_back() {
    clear_env();
    env::set_var("CHUNK_SIZE", "large");
    env::set_var("TOP_K_RESULTS", "-3");

    let config = Config::from_env().unwrap();
    assert_eq!(config.ingest.chunk_size, 1000);
    assert_eq!(config.retrieval.top_k, 6);

    clear_env();
}

#[test]
#[serial]
fn test_overlap_not_smaller_than_size_is_rejected() {
    clear_env();
    env::set_var("CHUNK_SIZE", "100");
    env::set_var("CHUNK_OVERLAP", "100");

    let result = Config::from_env();
    assert!(matches!(result, Err(AppError::Config { .. })));

    clear_env();
}
