//! Shared fixtures for integration tests: deterministic embedder, plain-text
//! loader standing in for PDF extraction, and a recording chat model.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use governance_assistant::config::{
    Config, IngestConfig, LogFormat, LoggingConfig, ModelConfig, OpenAiConfig, RequestConfig,
    RetrievalConfig, StoreConfig,
};
use governance_assistant::error::{IngestError, IngestResult, LlmError, LlmResult};
use governance_assistant::ingest::{IngestReport, Ingestor, SourceLoader};
use governance_assistant::llm::{ChatModel, ChatRequest, ChatResponse, Embedder};

pub const DIM: usize = 64;

/// Config rooted in a temporary directory: documents under `docs/`, store under `store/`.
pub fn test_config(root: &Path) -> Config {
    Config {
        openai: OpenAiConfig {
            api_key: Some("test-key".to_string()),
            base_url: "http://127.0.0.1:9".to_string(),
        },
        models: ModelConfig {
            chat: "test-chat".to_string(),
            embedding: "test-embed".to_string(),
        },
        store: StoreConfig {
            path: root.join("store").join("vectors.db"),
            collection: "test_collection".to_string(),
            max_connections: 2,
        },
        ingest: IngestConfig {
            documents_dir: root.join("docs"),
            chunk_size: 200,
            chunk_overlap: 20,
            embedding_batch_size: 4,
        },
        retrieval: RetrievalConfig {
            top_k: 4,
            similarity_threshold: None,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: LogFormat::Pretty,
        },
        request: RequestConfig {
            timeout_ms: 2000,
            max_retries: 0,
            retry_delay_ms: 10,
        },
    }
}

/// Write a document; pages are separated by form feeds.
pub fn write_doc(config: &Config, name: &str, pages: &[&str]) -> PathBuf {
    std::fs::create_dir_all(&config.ingest.documents_dir).unwrap();
    let path = config.ingest.documents_dir.join(name);
    std::fs::write(&path, pages.join("\u{c}")).unwrap();
    path
}

/// Ingest the documents directory with the fixtures.
pub async fn ingest(config: &Config) -> IngestResult<IngestReport> {
    Ingestor::new(config, Arc::new(HashEmbedder::default()))
        .with_loader(Arc::new(TextLoader))
        .run()
        .await
}

/// Reads `.pdf` files as UTF-8 text. Content starting with `CORRUPT` fails to load.
pub struct TextLoader;

impl SourceLoader for TextLoader {
    fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false)
    }

    fn load_pages(&self, path: &Path) -> IngestResult<Vec<String>> {
        let text = std::fs::read_to_string(path)?;
        if text.starts_with("CORRUPT") {
            return Err(IngestError::SourceLoad {
                filename: path.file_name().unwrap().to_string_lossy().into_owned(),
                message: "invalid xref table".to_string(),
            });
        }
        Ok(text.split('\u{c}').map(String::from).collect())
    }
}

/// Bag-of-words hashing embedder. Dimension 0 is a constant bias so no vector is zero.
#[derive(Default)]
pub struct HashEmbedder {
    calls: AtomicUsize,
}

impl HashEmbedder {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub fn hash_embedding(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0f32; DIM];
    vector[0] = 1.0;
    for word in text
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let mut hash: u64 = 0xcbf29ce484222325;
        for byte in word.bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(0x100000001b3);
        }
        vector[1 + (hash as usize % (DIM - 1))] += 1.0;
    }
    vector
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, inputs: &[String]) -> LlmResult<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(inputs.iter().map(|t| hash_embedding(t)).collect())
    }

    fn model_name(&self) -> &str {
        "hash-embed"
    }
}

/// Constant-vector embedder with a configurable model name and dimension.
pub struct FixedEmbedder {
    model: &'static str,
    dim: usize,
    calls: AtomicUsize,
}

impl FixedEmbedder {
    pub fn new(model: &'static str, dim: usize) -> Self {
        Self {
            model,
            dim,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for FixedEmbedder {
    async fn embed(&self, inputs: &[String]) -> LlmResult<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(inputs.iter().map(|_| vec![1.0; self.dim]).collect())
    }

    fn model_name(&self) -> &str {
        self.model
    }
}

/// Embedder whose every call fails with a server error.
pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed(&self, _inputs: &[String]) -> LlmResult<Vec<Vec<f32>>> {
        Err(LlmError::Api {
            status: 503,
            message: "embedding backend down".to_string(),
        })
    }

    fn model_name(&self) -> &str {
        "failing-embed"
    }
}

/// Chat model returning a canned answer (or error) and recording requests.
pub struct FakeChat {
    reply: Result<String, u16>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl FakeChat {
    pub fn answering(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(status: u16) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(status),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for FakeChat {
    async fn complete(&self, request: ChatRequest) -> LlmResult<ChatResponse> {
        self.requests.lock().unwrap().push(request);
        match &self.reply {
            Ok(text) => Ok(ChatResponse::from_text(text.clone())),
            Err(status) => Err(LlmError::Api {
                status: *status,
                message: "upstream failure".to_string(),
            }),
        }
    }
}
