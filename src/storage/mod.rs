//! Persisted vector store for embedded document fragments.
//!
//! Fragments are written into a *generation*. A generation becomes visible
//! to readers only when it is activated, and activation removes every other
//! generation of the collection in the same transaction, so a rebuild never
//! exposes partial or duplicated content.

mod sqlite;


pub use sqlite::SqliteVectorStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{StorageError, StorageResult};

/// A bounded span of source text plus provenance metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    /// The fragment text.
    pub text: String,
    /// Display name of the originating document.
    pub source: String,
    /// File name of the originating document.
    pub filename: String,
    /// Zero-based page number, when the loader knows it.
    pub page: Option<u32>,
    /// Character offset of the fragment within its page text.
    pub start_index: usize,
}

impl Fragment {
    /// Create a fragment without page information.
    pub fn new(
        text: impl Into<String>,
        source: impl Into<String>,
        filename: impl Into<String>,
        start_index: usize,
    ) -> Self {
        Self {
            text: text.into(),
            source: source.into(),
            filename: filename.into(),
            page: None,
            start_index,
        }
    }

    /// Set the page number.
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }
}

/// A fragment paired with its embedding, ready to be stored.
#[derive(Debug, Clone)]
pub struct EmbeddedFragment {
    /// The fragment.
    pub fragment: Fragment,
    /// Its vector.
    pub embedding: Vec<f32>,
}

/// A search hit.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredFragment {
    /// The matching fragment.
    pub fragment: Fragment,
    /// Cosine similarity to the query, in `[-1, 1]`.
    pub score: f64,
}

/// Lifecycle state of a generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
    /// Being written by an ingestion run; invisible to readers.
    Building,
    /// The generation readers search.
    Active,
}

impl std::fmt::Display for GenerationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerationStatus::Building => write!(f, "building"),
            GenerationStatus::Active => write!(f, "active"),
        }
    }
}

impl std::str::FromStr for GenerationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "building" => Ok(GenerationStatus::Building),
            "active" => Ok(GenerationStatus::Active),
            _ => Err(format!("Unknown generation status: {}", s)),
        }
    }
}

/// One build of a collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Generation {
    /// Unique generation identifier.
    pub id: String,
    /// Collection this generation belongs to.
    pub collection: String,
    /// Embedding model used for every vector in the generation.
    pub embedding_model: String,
    /// Current lifecycle state.
    pub status: GenerationStatus,
    /// When the build started.
    pub created_at: DateTime<Utc>,
    /// When the generation was activated.
    pub activated_at: Option<DateTime<Utc>>,
}

impl Generation {
    /// Create a new building generation.
    pub fn new(collection: impl Into<String>, embedding_model: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            collection: collection.into(),
            embedding_model: embedding_model.into(),
            status: GenerationStatus::Building,
            created_at: Utc::now(),
            activated_at: None,
        }
    }
}

/// Vector store operations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Register a new building generation.
    async fn begin_generation(&self, generation: &Generation) -> StorageResult<()>;

    /// Append fragments to a building generation.
    async fn insert_fragments(
        &self,
        generation_id: &str,
        fragments: &[EmbeddedFragment],
    ) -> StorageResult<usize>;

    /// Make a generation the active one and delete all others in its collection.
    async fn activate_generation(&self, generation_id: &str) -> StorageResult<()>;

    /// Delete every non-active generation of a collection. Returns how many were removed.
    async fn discard_building(&self, collection: &str) -> StorageResult<u64>;

    /// The active generation of a collection, if any.
    async fn active_generation(&self, collection: &str) -> StorageResult<Option<Generation>>;

    /// Top `limit` fragments of the active generation by cosine similarity.
    ///
    /// Fails with [`StorageError::Unavailable`] when no generation was ever activated,
    /// and with [`StorageError::DimensionMismatch`] when the stored vectors do not
    /// have the query's dimension.
    async fn search(
        &self,
        collection: &str,
        query: &[f32],
        limit: usize,
    ) -> StorageResult<Vec<ScoredFragment>>;

    /// Number of fragments in a generation.
    async fn count_fragments(&self, generation_id: &str) -> StorageResult<u64>;
}

/// Cosine similarity, `None` when undefined (length mismatch or zero vector).
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f64> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let x64 = f64::from(x);
        let y64 = f64::from(y);
        dot += x64 * y64;
        norm_a += x64 * x64;
        norm_b += y64 * y64;
    }
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom <= f64::EPSILON {
        return None;
    }
    Some(dot / denom)
}

pub(crate) fn encode_embedding(vector: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(std::mem::size_of_val(vector));
    for &value in vector {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

pub(crate) fn decode_embedding(blob: &[u8]) -> StorageResult<Vec<f32>> {
    if blob.len() % 4 != 0 {
        return Err(StorageError::InvalidEmbedding {
            message: format!("blob length {} is not a multiple of 4", blob.len()),
        });
    }
    Ok(blob
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

pub(crate) fn validate_embedding(vector: &[f32]) -> StorageResult<()> {
    if vector.is_empty() {
        return Err(StorageError::InvalidEmbedding {
            message: "vector is empty".to_string(),
        });
    }
    if vector.iter().any(|v| !v.is_finite()) {
        return Err(StorageError::InvalidEmbedding {
            message: "vector contains non-finite values".to_string(),
        });
    }
    Ok(())
}
