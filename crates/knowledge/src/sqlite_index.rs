//! SQLite-backed semantic index.
//!
//! Embeddings are stored as little-endian f32 BLOBs keyed by
//! `(collection, id)` and ranked by brute-force cosine similarity. A question
//! bank is a few thousand rows, well within a linear scan per query.

use crate::embeddings::EmbeddingProvider;
use crate::semantic_index::SemanticIndex;
use crate::types::{CollectionInfo, SearchHit};
use ccna_core::{AppError, AppResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Semantic index stored in a SQLite file.
pub struct SqliteSemanticIndex {
    conn: Mutex<Connection>,
    collection: String,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl SqliteSemanticIndex {
    /// Open (or create) `collection` in the index at `db_path`.
    ///
    /// Fails if the collection was built with a different embedding
    /// provider, model or dimension count.
    pub fn open(
        db_path: &Path,
        collection: &str,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> AppResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Index(format!("Failed to create index directory: {}", e))
            })?;
        }

        let conn = Connection::open(db_path)
            .map_err(|e| AppError::Index(format!("Failed to open SQLite index: {}", e)))?;

        tracing::debug!("Opened semantic index at {:?}", db_path);
        Self::with_connection(conn, collection, embedder)
    }

    /// In-memory index, for tests.
    pub fn open_in_memory(
        collection: &str,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> AppResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| AppError::Index(format!("Failed to open SQLite index: {}", e)))?;
        Self::with_connection(conn, collection, embedder)
    }

    fn with_connection(
        conn: Connection,
        collection: &str,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> AppResult<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS collections (
                name TEXT PRIMARY KEY,
                provider TEXT NOT NULL,
                model TEXT NOT NULL,
                dimensions INTEGER NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS embeddings (
                collection TEXT NOT NULL,
                id INTEGER NOT NULL,
                document TEXT NOT NULL,
                embedding BLOB NOT NULL,
                PRIMARY KEY (collection, id)
            );
            "#,
        )
        .map_err(|e| AppError::Index(format!("Failed to create tables: {}", e)))?;

        let expected = CollectionInfo {
            name: collection.to_string(),
            provider: embedder.provider_name().to_string(),
            model: embedder.model_name().to_string(),
            dimensions: embedder.dimensions(),
            created_at: Utc::now(),
        };

        match read_collection(&conn, collection)? {
            Some(existing) => check_compatible(&existing, &expected)?,
            None => {
                conn.execute(
                    "INSERT INTO collections (name, provider, model, dimensions, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        expected.name,
                        expected.provider,
                        expected.model,
                        expected.dimensions as i64,
                        expected.created_at.to_rfc3339(),
                    ],
                )
                .map_err(|e| AppError::Index(format!("Failed to register collection: {}", e)))?;
                tracing::info!(
                    "Created collection '{}' ({} / {}, {} dims)",
                    expected.name,
                    expected.provider,
                    expected.model,
                    expected.dimensions
                );
            }
        }

        Ok(Self {
            conn: Mutex::new(conn),
            collection: collection.to_string(),
            embedder,
        })
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Index("Semantic index lock poisoned".to_string()))
    }

    /// Embedding settings this collection was created with.
    pub fn info(&self) -> AppResult<CollectionInfo> {
        let conn = self.lock()?;
        read_collection(&conn, &self.collection)?.ok_or_else(|| {
            AppError::Index(format!("Collection '{}' is not registered", self.collection))
        })
    }

    /// Rank every stored vector against each query vector.
    fn rank(&self, query_vectors: &[Vec<f32>], top_k: usize) -> AppResult<Vec<Vec<SearchHit>>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, document, embedding FROM embeddings
                 WHERE collection = ?1 ORDER BY id",
            )
            .map_err(|e| AppError::Index(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(params![self.collection], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Vec<u8>>(2)?,
                ))
            })
            .map_err(|e| AppError::Index(format!("Failed to query embeddings: {}", e)))?;

        let mut stored = Vec::new();
        for row in rows {
            let (id, document, bytes) =
                row.map_err(|e| AppError::Index(format!("Failed to read embedding row: {}", e)))?;
            stored.push((id, document, bytes_to_embedding(&bytes)?));
        }

        let results = query_vectors
            .iter()
            .map(|query| {
                let mut hits: Vec<SearchHit> = stored
                    .iter()
                    .map(|(id, document, embedding)| SearchHit {
                        id: *id,
                        document: document.clone(),
                        score: cosine_similarity(query, embedding),
                    })
                    .collect();

                // Stable sort keeps id order among equal scores
                hits.sort_by(|a, b| {
                    b.score
                        .partial_cmp(&a.score)
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
                hits.truncate(top_k);
                hits
            })
            .collect();

        Ok(results)
    }
}

#[async_trait::async_trait]
impl SemanticIndex for SqliteSemanticIndex {
    async fn upsert(&self, records: &[(i64, String)]) -> AppResult<()> {
        if records.is_empty() {
            return Ok(());
        }

        let documents: Vec<String> = records.iter().map(|(_, doc)| doc.clone()).collect();
        let embeddings = self.embedder.embed_batch(&documents).await?;

        if embeddings.len() != records.len() {
            return Err(AppError::Index(format!(
                "Embedding provider returned {} vectors for {} documents",
                embeddings.len(),
                records.len()
            )));
        }

        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| AppError::Index(format!("Failed to begin transaction: {}", e)))?;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT OR REPLACE INTO embeddings (collection, id, document, embedding)
                     VALUES (?1, ?2, ?3, ?4)",
                )
                .map_err(|e| AppError::Index(format!("Failed to prepare upsert: {}", e)))?;

            for ((id, document), embedding) in records.iter().zip(&embeddings) {
                stmt.execute(params![
                    self.collection,
                    id,
                    document,
                    embedding_to_bytes(embedding)
                ])
                .map_err(|e| AppError::Index(format!("Failed to upsert embedding: {}", e)))?;
            }
        }
        tx.commit()
            .map_err(|e| AppError::Index(format!("Failed to commit embeddings: {}", e)))?;

        tracing::debug!("Upserted {} documents into '{}'", records.len(), self.collection);
        Ok(())
    }

    async fn query(&self, queries: &[String], top_k: usize) -> AppResult<Vec<Vec<SearchHit>>> {
        let query_vectors = self.embedder.embed_batch(queries).await?;
        let results = self.rank(&query_vectors, top_k)?;

        tracing::debug!(
            "Queried '{}' with {} queries (top-{})",
            self.collection,
            queries.len(),
            top_k
        );

        Ok(results)
    }

    fn count(&self) -> AppResult<usize> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT COUNT(*) FROM embeddings WHERE collection = ?1",
            params![self.collection],
            |row| row.get::<_, i64>(0).map(|v| v as usize),
        )
        .map_err(|e| AppError::Index(format!("Failed to count embeddings: {}", e)))
    }

    fn reset(&self) -> AppResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM embeddings WHERE collection = ?1",
            params![self.collection],
        )
        .map_err(|e| AppError::Index(format!("Failed to delete embeddings: {}", e)))?;

        tracing::info!("Reset collection '{}'", self.collection);
        Ok(())
    }
}

fn read_collection(conn: &Connection, name: &str) -> AppResult<Option<CollectionInfo>> {
    let row = conn
        .query_row(
            "SELECT provider, model, dimensions, created_at FROM collections WHERE name = ?1",
            params![name],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, String>(3)?,
                ))
            },
        )
        .optional()
        .map_err(|e| AppError::Index(format!("Failed to read collection metadata: {}", e)))?;

    row.map(|(provider, model, dimensions, created_at)| -> AppResult<CollectionInfo> {
        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| AppError::Index(format!("Invalid collection timestamp: {}", e)))?;
        Ok(CollectionInfo {
            name: name.to_string(),
            provider,
            model,
            dimensions: dimensions as usize,
            created_at,
        })
    })
    .transpose()
}

fn check_compatible(existing: &CollectionInfo, expected: &CollectionInfo) -> AppResult<()> {
    if existing.provider != expected.provider
        || existing.model != expected.model
        || existing.dimensions != expected.dimensions
    {
        return Err(AppError::Index(format!(
            "Collection '{}' was built with {} / {} ({} dims) but the configured embedder is {} / {} ({} dims); rebuild it with `index --reset`",
            existing.name,
            existing.provider,
            existing.model,
            existing.dimensions,
            expected.provider,
            expected.model,
            expected.dimensions
        )));
    }
    Ok(())
}

/// Convert embedding vector to bytes for storage.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for &value in embedding {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Convert bytes back to embedding vector.
fn bytes_to_embedding(bytes: &[u8]) -> AppResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(AppError::Index(
            "Invalid embedding bytes length".to_string(),
        ));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// Calculate cosine similarity between two vectors.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
