use async_trait::async_trait;
use chrono::Utc;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, info, warn};

use super::{
    cosine_similarity, decode_embedding, encode_embedding, validate_embedding, EmbeddedFragment,
    Fragment, Generation, GenerationStatus, ScoredFragment, VectorStore,
};
use crate::config::StoreConfig;
use crate::error::{StorageError, StorageResult};

/// Static migrator that embeds migrations at compile time
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// SQLite-backed vector store
#[derive(Clone)]
pub struct SqliteVectorStore {
    pool: SqlitePool,
    path: PathBuf,
}

impl SqliteVectorStore {
    /// Open the store for writing, creating the database file if needed.
    pub async fn open(config: &StoreConfig) -> StorageResult<Self> {
        if let Some(parent) = config.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::Connection {
                message: format!("Failed to create store directory: {}", e),
            })?;
        }
        Self::connect(config, true).await
    }

    /// Open an already-built store for reading.
    ///
    /// Fails with [`StorageError::Unavailable`] when the database file does not exist,
    /// without creating it.
    pub async fn open_existing(config: &StoreConfig) -> StorageResult<Self> {
        if !config.path.exists() {
            return Err(StorageError::Unavailable {
                path: config.path.clone(),
            });
        }
        Self::connect(config, false).await
    }

    async fn connect(config: &StoreConfig, create: bool) -> StorageResult<Self> {
        let database_url = format!("sqlite://{}", config.path.display());

        let options = SqliteConnectOptions::from_str(&database_url)
            .map_err(|e| StorageError::Connection {
                message: format!("Invalid database URL: {}", e),
            })?
            .create_if_missing(create)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Connection {
                message: format!("Failed to connect to vector store: {}", e),
            })?;

        let store = Self {
            pool,
            path: config.path.clone(),
        };
        store.run_migrations().await?;

        Ok(store)
    }

    /// Run database migrations using embedded sqlx migrations
    async fn run_migrations(&self) -> StorageResult<()> {
        debug!("Running vector store migrations...");

        MIGRATOR.run(&self.pool).await.map_err(|e| StorageError::Migration {
            message: format!("Failed to run migrations: {}", e),
        })?;

        Ok(())
    }

    /// Close the pool, flushing pending writes.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn generation(&self, id: &str) -> StorageResult<Option<Generation>> {
        let row: Option<GenerationRow> = sqlx::query_as(
            r#"
            SELECT id, collection, embedding_model, status, created_at, activated_at
            FROM generations
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Generation::try_from).transpose()
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    async fn begin_generation(&self, generation: &Generation) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO generations (id, collection, embedding_model, status, created_at, activated_at)
            VALUES (?, ?, ?, ?, ?, NULL)
            "#,
        )
        .bind(&generation.id)
        .bind(&generation.collection)
        .bind(&generation.embedding_model)
        .bind(GenerationStatus::Building.to_string())
        .bind(generation.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        debug!(generation_id = %generation.id, collection = %generation.collection, "Generation started");
        Ok(())
    }

    async fn insert_fragments(
        &self,
        generation_id: &str,
        fragments: &[EmbeddedFragment],
    ) -> StorageResult<usize> {
        match self.generation(generation_id).await? {
            Some(g) if g.status == GenerationStatus::Building => {}
            _ => {
                return Err(StorageError::GenerationNotFound {
                    generation_id: generation_id.to_string(),
                })
            }
        }
        for item in fragments {
            validate_embedding(&item.embedding)?;
        }

        let mut tx = self.pool.begin().await?;

        let next_ordinal: i64 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(ordinal) + 1, 0) FROM fragments WHERE generation_id = ?",
        )
        .bind(generation_id)
        .fetch_one(&mut *tx)
        .await?;

        for (offset, item) in fragments.iter().enumerate() {
            let fragment = &item.fragment;
            sqlx::query(
                r#"
                INSERT INTO fragments
                    (id, generation_id, ordinal, text, source, filename, page, start_index,
                     embedding_dim, embedding)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(uuid::Uuid::new_v4().to_string())
            .bind(generation_id)
            .bind(next_ordinal + offset as i64)
            .bind(&fragment.text)
            .bind(&fragment.source)
            .bind(&fragment.filename)
            .bind(fragment.page.map(i64::from))
            .bind(fragment.start_index as i64)
            .bind(item.embedding.len() as i64)
            .bind(encode_embedding(&item.embedding))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(fragments.len())
    }

    async fn activate_generation(&self, generation_id: &str) -> StorageResult<()> {
        let generation =
            self.generation(generation_id)
                .await?
                .ok_or_else(|| StorageError::GenerationNotFound {
                    generation_id: generation_id.to_string(),
                })?;

        let mut tx = self.pool.begin().await?;

        // Fragments go with their generation (ON DELETE CASCADE).
        let retired = sqlx::query("DELETE FROM generations WHERE collection = ? AND id != ?")
            .bind(&generation.collection)
            .bind(generation_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query("UPDATE generations SET status = ?, activated_at = ? WHERE id = ?")
            .bind(GenerationStatus::Active.to_string())
            .bind(Utc::now().to_rfc3339())
            .bind(generation_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(
            generation_id = %generation_id,
            collection = %generation.collection,
            retired_generations = retired,
            "Generation activated"
        );
        Ok(())
    }

    async fn discard_building(&self, collection: &str) -> StorageResult<u64> {
        let removed = sqlx::query("DELETE FROM generations WHERE collection = ? AND status = ?")
            .bind(collection)
            .bind(GenerationStatus::Building.to_string())
            .execute(&self.pool)
            .await?
            .rows_affected();

        if removed > 0 {
            warn!(collection = %collection, removed, "Discarded unfinished generations");
        }
        Ok(removed)
    }

    async fn active_generation(&self, collection: &str) -> StorageResult<Option<Generation>> {
        let row: Option<GenerationRow> = sqlx::query_as(
            r#"
            SELECT id, collection, embedding_model, status, created_at, activated_at
            FROM generations
            WHERE collection = ? AND status = ?
            ORDER BY activated_at DESC
            LIMIT 1
            "#,
        )
        .bind(collection)
        .bind(GenerationStatus::Active.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Generation::try_from).transpose()
    }

    async fn search(
        &self,
        collection: &str,
        query: &[f32],
        limit: usize,
    ) -> StorageResult<Vec<ScoredFragment>> {
        let Some(active) = self.active_generation(collection).await? else {
            return Err(StorageError::Unavailable {
                path: self.path.clone(),
            });
        };
        validate_embedding(query)?;
        if limit == 0 {
            return Ok(Vec::new());
        }

        // Joined on status rather than on `active.id` so a swap landing between
        // the two statements still reads one complete generation.
        let rows: Vec<FragmentRow> = sqlx::query_as(
            r#"
            SELECT f.ordinal, f.text, f.source, f.filename, f.page, f.start_index, f.embedding
            FROM fragments f
            JOIN generations g ON g.id = f.generation_id
            WHERE g.collection = ? AND g.status = ?
            ORDER BY f.ordinal ASC
            "#,
        )
        .bind(collection)
        .bind(GenerationStatus::Active.to_string())
        .fetch_all(&self.pool)
        .await?;

        let mut hits: Vec<(i64, ScoredFragment)> = Vec::with_capacity(rows.len());
        for row in rows {
            let candidate = decode_embedding(&row.embedding)?;
            if candidate.len() != query.len() {
                return Err(StorageError::DimensionMismatch {
                    stored: candidate.len(),
                    query: query.len(),
                });
            }
            let Some(score) = cosine_similarity(query, &candidate) else {
                continue;
            };
            let ordinal = row.ordinal;
            hits.push((
                ordinal,
                ScoredFragment {
                    fragment: row.into_fragment(),
                    score,
                },
            ));
        }

        hits.sort_by(|(ord_a, a), (ord_b, b)| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| ord_a.cmp(ord_b))
        });
        hits.truncate(limit);

        debug!(
            generation_id = %active.id,
            hits = hits.len(),
            "Vector search completed"
        );
        Ok(hits.into_iter().map(|(_, hit)| hit).collect())
    }

    async fn count_fragments(&self, generation_id: &str) -> StorageResult<u64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM fragments WHERE generation_id = ?")
                .bind(generation_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count.max(0) as u64)
    }
}

// Internal row types for SQLx mapping
#[derive(sqlx::FromRow)]
struct GenerationRow {
    id: String,
    collection: String,
    embedding_model: String,
    status: String,
    created_at: String,
    activated_at: Option<String>,
}

impl TryFrom<GenerationRow> for Generation {
    type Error = StorageError;

    fn try_from(row: GenerationRow) -> Result<Self, Self::Error> {
        use chrono::DateTime;

        let status = row
            .status
            .parse()
            .map_err(|message| StorageError::Query { message })?;

        Ok(Self {
            id: row.id,
            collection: row.collection,
            embedding_model: row.embedding_model,
            status,
            created_at: DateTime::parse_from_rfc3339(&row.created_at)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
            activated_at: row
                .activated_at
                .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
                .map(|dt| dt.with_timezone(&Utc)),
        })
    }
}

#[derive(sqlx::FromRow)]
struct FragmentRow {
    ordinal: i64,
    text: String,
    source: String,
    filename: String,
    page: Option<i64>,
    start_index: i64,
    embedding: Vec<u8>,
}

impl FragmentRow {
    fn into_fragment(self) -> Fragment {
        Fragment {
            text: self.text,
            source: self.source,
            filename: self.filename,
            page: self.page.and_then(|p| u32::try_from(p).ok()),
            start_index: usize::try_from(self.start_index).unwrap_or_default(),
        }
    }
}
