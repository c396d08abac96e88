//! Local file-backed vector store
//!
//! Plays the role of the opaque vector database: records are embedded at
//! insert time, held in memory, and persisted as a JSON record file inside
//! the database directory when the store is bound to a path. Similarity
//! search is a brute-force cosine scan, which is adequate for the
//! single-writer document collections this system manages.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use docucite_core::{DocuciteError, Result, ScoredText, StoreContents};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use crate::{EmbeddingClient, StoreOpener, VectorStore};

/// Name of the record file inside a database directory
const RECORD_FILE: &str = "records.json";

const FORMAT_VERSION: u32 = 1;

/// One persisted record: id, text, metadata, and embedding
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredRecord {
    id: String,
    text: String,
    metadata: HashMap<String, String>,
    embedding: Vec<f32>,
}

/// On-disk representation of the store
#[derive(Debug, Serialize, Deserialize)]
struct RecordFile {
    version: u32,
    saved_at: DateTime<Utc>,
    records: Vec<StoredRecord>,
}

/// File-backed (or memory-only) vector store
pub struct LocalStore {
    /// Database directory; `None` means memory-only
    path: Option<PathBuf>,
    embedding: Arc<dyn EmbeddingClient>,
    records: RwLock<Vec<StoredRecord>>,
}

impl std::fmt::Debug for LocalStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl LocalStore {
    /// Open a store at `path`, loading any existing record file.
    ///
    /// The directory is created if absent; a directory without a record
    /// file opens as an empty store.
    pub fn open(path: Option<&Path>, embedding: Arc<dyn EmbeddingClient>) -> Result<Self> {
        let records = match path {
            Some(dir) => {
                std::fs::create_dir_all(dir).map_err(|e| {
                    DocuciteError::DatabaseError(format!(
                        "Failed to create store directory `{}`: {e}",
                        dir.display()
                    ))
                })?;
                Self::load_records(dir)?
            }
            None => Vec::new(),
        };

        Ok(Self {
            path: path.map(Path::to_path_buf),
            embedding,
            records: RwLock::new(records),
        })
    }

    fn load_records(dir: &Path) -> Result<Vec<StoredRecord>> {
        let file = dir.join(RECORD_FILE);
        if !file.exists() {
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(&file).map_err(|e| {
            DocuciteError::DatabaseError(format!(
                "Failed to read record file `{}`: {e}",
                file.display()
            ))
        })?;

        let parsed: RecordFile = serde_json::from_str(&content).map_err(|e| {
            DocuciteError::DatabaseError(format!(
                "Corrupt record file `{}`: {e}",
                file.display()
            ))
        })?;

        if parsed.version != FORMAT_VERSION {
            return Err(DocuciteError::DatabaseError(format!(
                "Unsupported record file version {}",
                parsed.version
            )));
        }

        Ok(parsed.records)
    }

    /// Write all records to disk. No-op for memory-only stores.
    fn persist(&self, records: &[StoredRecord]) -> Result<()> {
        let Some(dir) = &self.path else {
            return Ok(());
        };

        let file = RecordFile {
            version: FORMAT_VERSION,
            saved_at: Utc::now(),
            records: records.to_vec(),
        };

        let content = serde_json::to_string(&file)
            .map_err(|e| DocuciteError::DatabaseError(format!("Serialization failed: {e}")))?;

        // Write-then-rename so a crash mid-write leaves the old file intact
        let target = dir.join(RECORD_FILE);
        let tmp = dir.join(format!("{RECORD_FILE}.tmp"));
        std::fs::write(&tmp, content).map_err(|e| {
            DocuciteError::DatabaseError(format!(
                "Failed to write record file `{}`: {e}",
                tmp.display()
            ))
        })?;
        std::fs::rename(&tmp, &target).map_err(|e| {
            DocuciteError::DatabaseError(format!(
                "Failed to replace record file `{}`: {e}",
                target.display()
            ))
        })?;

        Ok(())
    }
}

fn cosine_sim(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if mag_a < f32::EPSILON || mag_b < f32::EPSILON {
        0.0
    } else {
        dot / (mag_a * mag_b)
    }
}

#[async_trait]
impl VectorStore for LocalStore {
    async fn add_texts(
        &self,
        texts: Vec<String>,
        metadatas: Vec<HashMap<String, String>>,
    ) -> Result<Vec<String>> {
        if texts.len() != metadatas.len() {
            return Err(DocuciteError::DatabaseError(format!(
                "Text/metadata count mismatch: {} texts, {} metadatas",
                texts.len(),
                metadatas.len()
            )));
        }

        let embeddings = self.embedding.embed_batch(&texts).await?;

        let new_records: Vec<StoredRecord> = texts
            .into_iter()
            .zip(metadatas)
            .zip(embeddings)
            .map(|((text, metadata), embedding)| StoredRecord {
                id: Uuid::new_v4().to_string(),
                text,
                metadata,
                embedding,
            })
            .collect();
        let ids: Vec<String> = new_records.iter().map(|r| r.id.clone()).collect();

        let mut records = self.records.write().unwrap();
        records.extend(new_records);
        self.persist(&records)?;

        tracing::debug!(added = ids.len(), total = records.len(), "Stored records");

        Ok(ids)
    }

    async fn get(&self) -> Result<StoreContents> {
        let records = self.records.read().unwrap();
        Ok(StoreContents {
            ids: records.iter().map(|r| r.id.clone()).collect(),
            metadatas: records.iter().map(|r| r.metadata.clone()).collect(),
        })
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.records.read().unwrap().len())
    }

    async fn similarity_search(&self, query: &str, top_k: usize) -> Result<Vec<ScoredText>> {
        let query_vec = self.embedding.embed(query).await?;

        let records = self.records.read().unwrap();
        let mut scored: Vec<ScoredText> = records
            .iter()
            .map(|r| ScoredText {
                id: r.id.clone(),
                text: r.text.clone(),
                metadata: r.metadata.clone(),
                score: cosine_sim(&query_vec, &r.embedding),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(top_k);

        Ok(scored)
    }
}

/// Opens [`LocalStore`] instances bound to a shared embedding client
pub struct LocalStoreOpener {
    embedding: Arc<dyn EmbeddingClient>,
}

impl LocalStoreOpener {
    pub fn new(embedding: Arc<dyn EmbeddingClient>) -> Self {
        Self { embedding }
    }
}

#[async_trait]
impl StoreOpener for LocalStoreOpener {
    async fn open(&self, path: Option<&Path>) -> Result<Arc<dyn VectorStore>> {
        Ok(Arc::new(LocalStore::open(path, self.embedding.clone())?))
    }
}

// ============================================================================
// Tests
// ============================================================================
