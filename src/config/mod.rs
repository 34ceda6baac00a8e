use std::env;
use std::path::PathBuf;

use crate::error::AppError;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Model API credentials and endpoint.
    pub openai: OpenAiConfig,
    /// Model identifiers.
    pub models: ModelConfig,
    /// Vector store location.
    pub store: StoreConfig,
    /// Document ingestion settings.
    pub ingest: IngestConfig,
    /// Retrieval settings.
    pub retrieval: RetrievalConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// HTTP request behavior.
    pub request: RequestConfig,
}

/// OpenAI-compatible API configuration
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Bearer credential. `None` is tolerated at startup; every model call fails.
    pub api_key: Option<String>,
    /// API root, without trailing slash.
    pub base_url: String,
}

/// Model identifiers for chat and embeddings
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Chat completion model.
    pub chat: String,
    /// Embedding model.
    pub embedding: String,
}

/// Vector store location
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// SQLite database file.
    pub path: PathBuf,
    /// Collection name inside the store.
    pub collection: String,
    /// Connection pool size.
    pub max_connections: u32,
}

/// Ingestion pipeline configuration
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Directory scanned for PDF files.
    pub documents_dir: PathBuf,
    /// Maximum fragment length, in characters.
    pub chunk_size: usize,
    /// Characters shared by consecutive fragments.
    pub chunk_overlap: usize,
    /// Fragments per embedding request.
    pub embedding_batch_size: usize,
}

/// Retrieval configuration
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    /// Default K for ad-hoc searches. Agents use their own fixed depth.
    pub top_k: usize,
    /// Minimum cosine similarity a fragment must reach. `None` disables filtering.
    pub similarity_threshold: Option<f64>,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    /// Human-readable lines.
    Pretty,
    /// One JSON object per line.
    Json,
}

/// HTTP request configuration
#[derive(Debug, Clone)]
pub struct RequestConfig {
    /// Per-request timeout.
    pub timeout_ms: u64,
    /// Retries after the first attempt for transient failures.
    pub max_retries: u32,
    /// Base delay of the exponential backoff.
    pub retry_delay_ms: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, AppError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let openai = OpenAiConfig {
            api_key: env::var("OPENAI_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
        };

        let models = ModelConfig {
            chat: env::var("CHAT_MODEL").unwrap_or_else(|_| "gpt-5.1".to_string()),
            embedding: env::var("EMBEDDING_MODEL")
                .unwrap_or_else(|_| "text-embedding-3-large".to_string()),
        };

        let store = StoreConfig {
            path: PathBuf::from(
                env::var("VECTOR_STORE_PATH")
                    .unwrap_or_else(|_| "./data/vector_store.db".to_string()),
            ),
            collection: env::var("VECTOR_COLLECTION")
                .unwrap_or_else(|_| "data_governance_rag".to_string()),
            max_connections: parse_or("DATABASE_MAX_CONNECTIONS", 5),
        };

        let ingest = IngestConfig {
            documents_dir: PathBuf::from(
                env::var("DOCUMENTS_DIR").unwrap_or_else(|_| "./data/documents".to_string()),
            ),
            chunk_size: parse_or("CHUNK_SIZE", 1000),
            chunk_overlap: parse_or("CHUNK_OVERLAP", 150),
            embedding_batch_size: parse_or("EMBEDDING_BATCH_SIZE", 64),
        };
        ingest.validate()?;

        let retrieval = RetrievalConfig {
            top_k: parse_or("TOP_K_RESULTS", 6),
            similarity_threshold: env::var("SIMILARITY_THRESHOLD")
                .ok()
                .and_then(|s| s.parse().ok()),
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .to_lowercase()
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        };

        let request = RequestConfig {
            timeout_ms: parse_or("REQUEST_TIMEOUT_MS", 60000),
            max_retries: parse_or("MAX_RETRIES", 2),
            retry_delay_ms: parse_or("RETRY_DELAY_MS", 1000),
        };

        Ok(Config {
            openai,
            models,
            store,
            ingest,
            retrieval,
            logging,
            request,
        })
    }

    /// Report credentials the model client will need but could not find.
    pub fn missing_credentials(&self) -> Option<AppError> {
        if self.openai.api_key.is_none() {
            return Some(AppError::ConfigurationMissing {
                key: "OPENAI_API_KEY".to_string(),
            });
        }
        None
    }
}

impl IngestConfig {
    /// Reject chunking parameters the splitter cannot honor.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.chunk_size == 0 {
            return Err(AppError::Config {
                message: "CHUNK_SIZE must be greater than zero".to_string(),
            });
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(AppError::Config {
                message: format!(
                    "CHUNK_OVERLAP ({}) must be smaller than CHUNK_SIZE ({})",
                    self.chunk_overlap, self.chunk_size
                ),
            });
        }
        if self.embedding_batch_size == 0 {
            return Err(AppError::Config {
                message: "EMBEDDING_BATCH_SIZE must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 60000,
            max_retries: 2,
            retry_delay_ms: 1000,
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            documents_dir: PathBuf::from("./data/documents"),
            chunk_size: 1000,
            chunk_overlap: 150,
            embedding_batch_size: 64,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 6,
            similarity_threshold: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingest_config_defaults_are_valid() {
        assert!(IngestConfig::default().validate().is_ok());
    }

    #[test]
    fn test_ingest_config_rejects_overlap_not_smaller_than_size() {
        let config = IngestConfig {
            chunk_size: 100,
            chunk_overlap: 100,
            ..IngestConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, AppError::Config { .. }));
        assert!(err.to_string().contains("CHUNK_OVERLAP"));
    }

    #[test]
    fn test_ingest_config_rejects_zero_size() {
        let config = IngestConfig {
            chunk_size: 0,
            chunk_overlap: 0,
            ..IngestConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_request_config_default() {
        let config = RequestConfig::default();
        assert_eq!(config.timeout_ms, 60000);
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.retry_delay_ms, 1000);
    }
}
