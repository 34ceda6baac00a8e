//! Document store builder.
//!
//! A run loads every PDF of the documents directory, splits pages into
//! fragments, embeds them in batches into a fresh store generation and
//! activates that generation. Until activation the previous generation
//! keeps serving readers.

mod loader;
mod splitter;

pub use loader::{
    display_name, load_documents, LoadSummary, PageText, PdfLoader, SourceDocument,
    SourceLoadFailure, SourceLoader,
};
pub use splitter::{TextChunk, TextSplitter, DEFAULT_SEPARATORS};

use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info};

use crate::config::{Config, IngestConfig, StoreConfig};
use crate::error::{IngestError, IngestResult};
use crate::llm::Embedder;
use crate::storage::{EmbeddedFragment, Fragment, Generation, SqliteVectorStore, VectorStore};

/// Pipeline stage, logged on each transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestStage {
    /// Reading source files.
    Loading,
    /// Splitting pages into fragments.
    Chunking,
    /// Embedding fragments into the new generation.
    Embedding,
    /// Swapping the new generation in.
    Activating,
    /// The new generation is live.
    Ready,
}

impl std::fmt::Display for IngestStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestStage::Loading => write!(f, "loading"),
            IngestStage::Chunking => write!(f, "chunking"),
            IngestStage::Embedding => write!(f, "embedding"),
            IngestStage::Activating => write!(f, "activating"),
            IngestStage::Ready => write!(f, "ready"),
        }
    }
}

/// Whether every discovered file made it into the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Every discovered file was indexed.
    Complete,
    /// Some files were skipped.
    Partial,
}

/// Summary of a successful rebuild.
#[derive(Debug, Clone)]
pub struct IngestReport {
    /// Generation now active.
    pub generation_id: String,
    /// Files discovered.
    pub files_found: usize,
    /// Files loaded.
    pub files_loaded: usize,
    /// Pages loaded across all files.
    pub pages_loaded: usize,
    /// Fragments in the new generation.
    pub fragments_indexed: u64,
    /// Files skipped because they could not be read.
    pub failures: Vec<SourceLoadFailure>,
}

impl IngestReport {
    /// Complete when no file was skipped.
    pub fn outcome(&self) -> IngestOutcome {
        if self.failures.is_empty() {
            IngestOutcome::Complete
        } else {
            IngestOutcome::Partial
        }
    }
}

/// Rebuilds the vector store from the documents directory.
pub struct Ingestor {
    config: IngestConfig,
    store_config: StoreConfig,
    loader: Arc<dyn SourceLoader>,
    embedder: Arc<dyn Embedder>,
}

impl Ingestor {
    /// Create an ingestor reading PDFs.
    pub fn new(config: &Config, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            config: config.ingest.clone(),
            store_config: config.store.clone(),
            loader: Arc::new(PdfLoader),
            embedder,
        }
    }

    /// Replace the source loader.
    pub fn with_loader(mut self, loader: Arc<dyn SourceLoader>) -> Self {
        self.loader = loader;
        self
    }

    fn enter(&self, stage: IngestStage) {
        info!(stage = %stage, collection = %self.store_config.collection, "Ingestion stage");
    }

    /// Full rebuild of the configured collection.
    pub async fn run(&self) -> IngestResult<IngestReport> {
        let start = Instant::now();

        self.enter(IngestStage::Loading);
        let loaded = load_documents(&self.config.documents_dir, Arc::clone(&self.loader)).await?;
        if loaded.documents.is_empty() {
            return Err(self.empty_corpus(&loaded));
        }

        self.enter(IngestStage::Chunking);
        let fragments = self.chunk(&loaded.documents);
        info!(fragments = fragments.len(), "Documents split into fragments");
        if fragments.is_empty() {
            return Err(self.empty_corpus(&loaded));
        }

        let store = SqliteVectorStore::open(&self.store_config).await?;
        let result = self.build_generation(&store, fragments).await;
        store.close().await;
        let (generation_id, fragments_indexed) = result?;

        self.enter(IngestStage::Ready);
        let report = IngestReport {
            generation_id,
            files_found: loaded.files_found,
            files_loaded: loaded.documents.len(),
            pages_loaded: loaded.page_count(),
            fragments_indexed,
            failures: loaded.failures,
        };
        info!(
            generation_id = %report.generation_id,
            files = report.files_loaded,
            failed = report.failures.len(),
            fragments = report.fragments_indexed,
            latency_ms = start.elapsed().as_millis() as u64,
            "Vector store rebuilt"
        );
        Ok(report)
    }

    fn empty_corpus(&self, loaded: &LoadSummary) -> IngestError {
        IngestError::EmptyCorpus {
            path: self.config.documents_dir.clone(),
            failures: loaded.failures.len(),
        }
    }

    /// Split every page, keeping page provenance on each fragment.
    fn chunk(&self, documents: &[SourceDocument]) -> Vec<Fragment> {
        let splitter = TextSplitter::from_config(&self.config);
        let mut fragments = Vec::new();
        for document in documents {
            for page in &document.pages {
                for chunk in splitter.split_with_offsets(&page.text) {
                    fragments.push(
                        Fragment::new(
                            chunk.text,
                            document.source.clone(),
                            document.filename.clone(),
                            chunk.start_index,
                        )
                        .with_page(page.page),
                    );
                }
            }
        }
        fragments
    }

    async fn build_generation(
        &self,
        store: &SqliteVectorStore,
        fragments: Vec<Fragment>,
    ) -> IngestResult<(String, u64)> {
        store.discard_building(&self.store_config.collection).await?;

        let generation = Generation::new(
            self.store_config.collection.clone(),
            self.embedder.model_name(),
        );
        store.begin_generation(&generation).await?;

        self.enter(IngestStage::Embedding);
        if let Err(e) = self.embed_into(store, &generation.id, fragments).await {
            error!(generation_id = %generation.id, error = %e, "Embedding failed, discarding generation");
            if let Err(discard) = store.discard_building(&self.store_config.collection).await {
                error!(error = %discard, "Failed to discard unfinished generation");
            }
            return Err(e);
        }

        self.enter(IngestStage::Activating);
        store.activate_generation(&generation.id).await?;
        let count = store.count_fragments(&generation.id).await?;
        Ok((generation.id, count))
    }

    async fn embed_into(
        &self,
        store: &SqliteVectorStore,
        generation_id: &str,
        fragments: Vec<Fragment>,
    ) -> IngestResult<()> {
        let batch_size = self.config.embedding_batch_size.max(1);
        let total_batches = fragments.len().div_ceil(batch_size);

        for (batch_index, batch) in fragments.chunks(batch_size).enumerate() {
            let inputs: Vec<String> = batch.iter().map(|f| f.text.clone()).collect();
            let vectors = self.embedder.embed(&inputs).await?;
            if vectors.len() != batch.len() {
                return Err(IngestError::Embedding(crate::error::LlmError::InvalidResponse {
                    message: format!(
                        "expected {} embeddings, got {}",
                        batch.len(),
                        vectors.len()
                    ),
                }));
            }

            let embedded: Vec<EmbeddedFragment> = batch
                .iter()
                .cloned()
                .zip(vectors)
                .map(|(fragment, embedding)| EmbeddedFragment {
                    fragment,
                    embedding,
                })
                .collect();
            store.insert_fragments(generation_id, &embedded).await?;

            info!(
                batch = batch_index + 1,
                total_batches,
                fragments = batch.len(),
                "Embedded batch"
            );
        }
        Ok(())
    }
}
