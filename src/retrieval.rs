//! Similarity search over the persisted vector store.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::{Config, StoreConfig};
use crate::error::{RetrievalError, RetrievalResult};
use crate::llm::Embedder;
use crate::storage::{Fragment, ScoredFragment, SqliteVectorStore, VectorStore};

/// Listing returned by [`format_sources`] for an empty fragment list.
pub const NO_SOURCES: &str = "Aucune source.";

/// Embeds queries and ranks fragments of the active store generation.
pub struct Retriever {
    store_config: StoreConfig,
    store: OnceCell<SqliteVectorStore>,
    embedder: Arc<dyn Embedder>,
    similarity_threshold: Option<f64>,
}

impl Retriever {
    /// Create a retriever over `store_config` without score filtering.
    pub fn new(store_config: StoreConfig, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            store_config,
            store: OnceCell::new(),
            embedder,
            similarity_threshold: None,
        }
    }

    /// Create a retriever from application settings.
    pub fn from_config(config: &Config, embedder: Arc<dyn Embedder>) -> Self {
        Self::new(config.store.clone(), embedder)
            .with_similarity_threshold(config.retrieval.similarity_threshold)
    }

    /// Override the minimum similarity score.
    pub fn with_similarity_threshold(mut self, threshold: Option<f64>) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    /// Store handle, opened on first use.
    async fn store(&self) -> RetrievalResult<&SqliteVectorStore> {
        let store = self
            .store
            .get_or_try_init(|| async {
                debug!(path = %self.store_config.path.display(), "Opening vector store");
                SqliteVectorStore::open_existing(&self.store_config).await
            })
            .await?;
        Ok(store)
    }

    /// Top `k` fragments for `query`, best first.
    pub async fn retrieve(&self, query: &str, k: usize) -> RetrievalResult<Vec<Fragment>> {
        Ok(self
            .search_scored(query, k)
            .await?
            .into_iter()
            .map(|hit| hit.fragment)
            .collect())
    }

    /// [`Retriever::retrieve`], aborted with [`RetrievalError::Cancelled`] when `cancel` fires.
    pub async fn retrieve_cancellable(
        &self,
        query: &str,
        k: usize,
        cancel: &CancellationToken,
    ) -> RetrievalResult<Vec<Fragment>> {
        if cancel.is_cancelled() {
            return Err(RetrievalError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(RetrievalError::Cancelled),
            result = self.retrieve(query, k) => result,
        }
    }

    /// Top `k` hits with their scores.
    pub async fn search_scored(
        &self,
        query: &str,
        k: usize,
    ) -> RetrievalResult<Vec<ScoredFragment>> {
        if k == 0 {
            return Err(RetrievalError::InvalidDepth);
        }
        let start = Instant::now();
        let store = self.store().await?;
        let collection = &self.store_config.collection;

        // Fail before paying for an embedding call.
        let Some(active) = store.active_generation(collection).await? else {
            return Err(RetrievalError::StoreUnavailable {
                path: self.store_config.path.clone(),
            });
        };
        if active.embedding_model != self.embedder.model_name() {
            return Err(RetrievalError::EmbeddingModelMismatch {
                store_model: active.embedding_model,
                query_model: self.embedder.model_name().to_string(),
            });
        }

        let mut vectors = self.embedder.embed(&[query.to_string()]).await?;
        let query_vector = vectors.pop().ok_or_else(|| {
            RetrievalError::Embedding(crate::error::LlmError::InvalidResponse {
                message: "no embedding returned for query".to_string(),
            })
        })?;

        let mut hits = store.search(collection, &query_vector, k).await?;
        if let Some(threshold) = self.similarity_threshold {
            hits.retain(|hit| hit.score >= threshold);
        }

        info!(
            k,
            hits = hits.len(),
            latency_ms = start.elapsed().as_millis() as u64,
            "Retrieval completed"
        );
        Ok(hits)
    }
}

/// One `- {source} (page {page})` line per distinct source/page, in rank order.
pub fn format_sources(fragments: &[Fragment]) -> String {
    if fragments.is_empty() {
        return NO_SOURCES.to_string();
    }

    let mut seen: Vec<(&str, Option<u32>)> = Vec::new();
    let mut lines = Vec::new();
    for fragment in fragments {
        let key = (fragment.source.as_str(), fragment.page);
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);
        let page = fragment
            .page
            .map(|p| p.to_string())
            .unwrap_or_else(|| "?".to_string());
        lines.push(format!("- {} (page {})", fragment.source, page));
    }
    lines.join("\n")
}
