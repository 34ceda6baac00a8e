use std::path::PathBuf;

use thiserror::Error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid configuration value.
    #[error("Configuration error: {message}")]
    Config {
        /// Details.
        message: String,
    },

    /// Required setting absent.
    #[error("Configuration missing: {key} is not set")]
    ConfigurationMissing {
        /// Environment variable name.
        key: String,
    },

    /// Vector store failure.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Model API failure.
    #[error("Model error: {0}")]
    Llm(#[from] LlmError),

    /// Retrieval failure.
    #[error("Retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    /// Ingestion failure.
    #[error("Ingestion error: {0}")]
    Ingest(#[from] IngestError),

    /// Agent failure.
    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),
}

/// Vector store errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Could not open the database.
    #[error("Database connection failed: {message}")]
    Connection {
        /// Details.
        message: String,
    },

    /// The database file does not exist, or nothing was ever activated.
    #[error("Vector store unavailable at {path}: no documents have been ingested")]
    Unavailable {
        /// Path involved.
        path: PathBuf,
    },

    /// A query failed or returned unexpected data.
    #[error("Query failed: {message}")]
    Query {
        /// Details.
        message: String,
    },

    /// No building generation with this id.
    #[error("Generation not found: {generation_id}")]
    GenerationNotFound {
        /// Requested generation.
        generation_id: String,
    },

    /// Embedding rejected: empty or not finite.
    #[error("Invalid embedding: {message}")]
    InvalidEmbedding {
        /// Details.
        message: String,
    },

    /// Stored vectors and the query vector differ in length.
    #[error("Embedding dimension mismatch: store holds {stored}-dimensional vectors, query has {query}")]
    DimensionMismatch {
        /// Dimension of the stored vectors.
        stored: usize,
        /// Dimension of the query vector.
        query: usize,
    },

    /// Embedded migrations failed.
    #[error("Migration failed: {message}")]
    Migration {
        /// Details.
        message: String,
    },

    /// Underlying driver error.
    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

/// Chat / embedding API errors
#[derive(Debug, Error)]
pub enum LlmError {
    /// No API key configured.
    #[error("OPENAI_API_KEY is not configured")]
    MissingCredential,

    /// Transient failures persisted through every retry.
    #[error("Model API unavailable: {message} (retries: {retries})")]
    Unavailable {
        /// Details.
        message: String,
        /// Retries attempted.
        retries: u32,
    },

    /// Non-success HTTP status.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Details.
        message: String,
    },

    /// Body could not be parsed or carried no usable content.
    #[error("Invalid response: {message}")]
    InvalidResponse {
        /// Details.
        message: String,
    },

    /// Request exceeded the configured timeout.
    #[error("Request timeout after {timeout_ms}ms")]
    Timeout {
        /// Configured timeout.
        timeout_ms: u64,
    },

    /// Transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl LlmError {
    /// Whether a repeated attempt could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::Timeout { .. } | LlmError::Http(_) => true,
            LlmError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Retriever errors
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// No store file, or no active generation.
    #[error("Vector store unavailable at {path}: run ingestion first")]
    StoreUnavailable {
        /// Path involved.
        path: PathBuf,
    },

    /// Zero fragments requested.
    #[error("Invalid retrieval depth: k must be greater than zero")]
    InvalidDepth,

    /// Embedding the query failed.
    #[error("Query embedding failed: {0}")]
    Embedding(#[from] LlmError),

    /// The store was built with another embedding model.
    #[error("Vector store was built with embedding model {store_model}, but queries use {query_model}: run ingestion again")]
    EmbeddingModelMismatch {
        /// Model recorded on the active generation.
        store_model: String,
        /// Model embedding the query.
        query_model: String,
    },

    /// The query vector does not match the stored vectors.
    #[error("Query embedding has {query} dimensions, the store holds {stored}: run ingestion again")]
    DimensionMismatch {
        /// Dimension of the stored vectors.
        stored: usize,
        /// Dimension of the query vector.
        query: usize,
    },

    /// Other store failure.
    #[error("Store error: {0}")]
    Store(StorageError),

    /// The caller cancelled the search.
    #[error("Retrieval cancelled")]
    Cancelled,
}

impl From<StorageError> for RetrievalError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Unavailable { path } => RetrievalError::StoreUnavailable { path },
            StorageError::DimensionMismatch { stored, query } => {
                RetrievalError::DimensionMismatch { stored, query }
            }
            other => RetrievalError::Store(other),
        }
    }
}

/// Ingestion pipeline errors
#[derive(Debug, Error)]
pub enum IngestError {
    /// The documents directory does not exist.
    #[error("Documents directory not found: {path}")]
    DocumentsDirMissing {
        /// Path involved.
        path: PathBuf,
    },

    /// One file could not be read.
    #[error("Failed to load {filename}: {message}")]
    SourceLoad {
        /// File name.
        filename: String,
        /// Details.
        message: String,
    },

    /// Nothing indexable was found.
    #[error("No documents could be loaded from {path} ({failures} file(s) failed)")]
    EmptyCorpus {
        /// Path involved.
        path: PathBuf,
        /// Files that failed to load.
        failures: usize,
    },

    /// Embedding fragments failed.
    #[error("Embedding failed: {0}")]
    Embedding(#[from] LlmError),

    /// Writing the store failed.
    #[error("Store error: {0}")]
    Store(#[from] StorageError),

    /// File system error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Agent execution errors
#[derive(Debug, Error)]
pub enum AgentError {
    /// The model call failed.
    #[error("{agent} failed to get a model answer: {source}")]
    Execution {
        /// Label of the agent.
        agent: String,
        /// Underlying error.
        #[source]
        source: LlmError,
    },

    /// Retrieving context failed.
    #[error("{agent} failed to retrieve context: {source}")]
    Retrieval {
        /// Label of the agent.
        agent: String,
        /// Underlying error.
        #[source]
        source: RetrievalError,
    },

    /// The turn was cancelled.
    #[error("{agent} was cancelled")]
    Cancelled {
        /// Label of the agent.
        agent: String,
    },
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type alias for model API operations
pub type LlmResult<T> = Result<T, LlmError>;

/// Result type alias for retrieval operations
pub type RetrievalResult<T> = Result<T, RetrievalError>;

/// Result type alias for ingestion
pub type IngestResult<T> = Result<T, IngestError>;
