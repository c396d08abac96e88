//! Docucite DB - Database and document management
//!
//! Owns the lifecycle of one vector-backed document collection: creation,
//! loading, and validated incremental insertion. Before any write the
//! service enforces that every document carries usable metadata with a
//! `title`, and that no stored title is duplicated under case-insensitive
//! comparison. Validation happens entirely before the batch commit, so a
//! failed batch inserts nothing.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use docucite_core::{Document, DocuciteError, Result, TITLE_KEY};
use docucite_vector::{StoreOpener, VectorStore};

pub mod document;

pub use document::DocumentService;

/// Manages one persisted (or in-memory) vector-backed document collection.
///
/// A service starts unbound; exactly one of [`create_database`] or
/// [`load_database`] binds the store handle. There is no transition back
/// and no explicit close. Pass `None` as the database name for an
/// ephemeral in-memory collection.
///
/// [`create_database`]: DatabaseService::create_database
/// [`load_database`]: DatabaseService::load_database
pub struct DatabaseService {
    base_dir: PathBuf,
    database_path: Option<PathBuf>,
    vectordb: Option<Arc<dyn VectorStore>>,
    opener: Arc<dyn StoreOpener>,
}

impl DatabaseService {
    /// Create an unbound service for the database `name` under `base_dir`.
    pub fn new(
        base_dir: impl Into<PathBuf>,
        name: Option<&str>,
        opener: Arc<dyn StoreOpener>,
    ) -> Self {
        let base_dir = base_dir.into();
        let database_path = name.map(|n| base_dir.join(n));
        Self {
            base_dir,
            database_path,
            vectordb: None,
            opener,
        }
    }

    /// Path of the backing directory, if the database is named
    pub fn database_path(&self) -> Option<&Path> {
        self.database_path.as_deref()
    }

    /// Whether a store handle is bound
    pub fn is_bound(&self) -> bool {
        self.vectordb.is_some()
    }

    /// The bound store handle, for retrieval layers built on top
    pub fn store(&self) -> Result<Arc<dyn VectorStore>> {
        self.vectordb.clone().ok_or_else(|| {
            DocuciteError::DatabaseError("No database is bound to this service.".to_string())
        })
    }

    /// Create a new, empty database and bind it.
    ///
    /// Fails if the target path already exists as a directory. The base
    /// directory is created first if absent, for in-memory databases too.
    pub async fn create_database(&mut self) -> Result<()> {
        if let Some(path) = &self.database_path {
            if dir_exists(path) {
                return Err(DocuciteError::DatabaseError(format!(
                    "Cannot create database `{}` because it already exists.",
                    path.display()
                )));
            }
        }

        if !dir_exists(&self.base_dir) {
            tracing::info!(base_dir = %self.base_dir.display(), "Creating database base dir");
            std::fs::create_dir_all(&self.base_dir).map_err(|e| {
                DocuciteError::DatabaseError(format!(
                    "Failed to create base dir `{}`: {e}",
                    self.base_dir.display()
                ))
            })?;
        }

        self.vectordb = Some(self.opener.open(self.database_path.as_deref()).await?);

        match &self.database_path {
            Some(path) => tracing::info!(path = %path.display(), "Created database"),
            None => tracing::info!("Created in-memory database"),
        }

        Ok(())
    }

    /// Load an existing database from disk and bind it.
    ///
    /// Fails if the target path does not exist as a directory; in-memory
    /// databases cannot be loaded.
    pub async fn load_database(&mut self) -> Result<()> {
        let path = match &self.database_path {
            Some(path) if dir_exists(path) => path.clone(),
            Some(path) => {
                return Err(DocuciteError::DatabaseError(format!(
                    "Tried to load database `{}`, but it does not exist.",
                    path.display()
                )))
            }
            None => {
                return Err(DocuciteError::DatabaseError(
                    "Tried to load a database, but no database name was given.".to_string(),
                ))
            }
        };

        tracing::info!(path = %path.display(), "Loading database");

        let store = self.opener.open(Some(&path)).await?;
        let count = store.count().await?;
        self.vectordb = Some(store);

        tracing::info!(path = %path.display(), records = count, "Loaded database");

        Ok(())
    }

    /// Add documents to the bound database.
    ///
    /// Documents must have metadata, the metadata must have a `title`, and
    /// no title may already exist in the database (case-insensitive).
    /// All validation precedes the single batch write; on any failure
    /// nothing is inserted.
    pub async fn add_documents(&self, documents: &[Document]) -> Result<()> {
        let store = self.vectordb.as_ref().ok_or_else(|| {
            DocuciteError::DatabaseError(format!(
                "Tried to add documents to database `{}`, but this database does not exist.",
                self.path_label()
            ))
        })?;

        let pairs = DocumentService::documents_to_texts(documents);
        let (texts, metadatas): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();

        validate_documents_metadata(&texts, &metadatas)?;
        self.validate_documents_not_in_database(store.as_ref(), &metadatas)
            .await?;

        tracing::info!(
            count = documents.len(),
            database = %self.path_label(),
            "Adding documents to database"
        );

        store.add_texts(texts, metadatas).await?;

        let total = store.count().await?;
        tracing::info!(
            added = documents.len(),
            total = total,
            "Successfully added documents to database"
        );

        Ok(())
    }

    /// Documents are unique by the metadata field `title`, compared
    /// case-insensitively. Assumes metadata has already been validated.
    async fn validate_documents_not_in_database(
        &self,
        store: &dyn VectorStore,
        metadatas: &[std::collections::HashMap<String, String>],
    ) -> Result<()> {
        let existing: BTreeSet<String> = store.get().await?.lowercase_titles().into_iter().collect();
        let incoming: BTreeSet<String> = metadatas
            .iter()
            .filter_map(|m| m.get(TITLE_KEY))
            .map(|t| t.to_lowercase())
            .collect();

        let conflicts: Vec<&String> = incoming.intersection(&existing).collect();
        if !conflicts.is_empty() {
            let names: Vec<&str> = conflicts.iter().map(|s| s.as_str()).collect();
            return Err(DocuciteError::DatabaseError(format!(
                "Tried to add documents [{}] to database, but they already exist.",
                names.join(", ")
            )));
        }

        Ok(())
    }

    fn path_label(&self) -> String {
        self.database_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<in-memory>".to_string())
    }
}

fn dir_exists(path: &Path) -> bool {
    path.is_dir()
}

fn validate_documents_metadata(
    texts: &[String],
    metadatas: &[std::collections::HashMap<String, String>],
) -> Result<()> {
    // An empty batch and an empty metadata map are both treated as wholly
    // absent metadata.
    if metadatas.is_empty() || texts.len() != metadatas.len() {
        return Err(DocuciteError::MissingMetadataError(
            "At least one document you are trying to add has missing metadata.".to_string(),
        ));
    }

    for metadata in metadatas {
        if metadata.is_empty() {
            return Err(DocuciteError::MissingMetadataError(
                "At least one document you are trying to add has missing metadata.".to_string(),
            ));
        }
        if metadata.get(TITLE_KEY).map_or(true, |t| t.is_empty()) {
            return Err(DocuciteError::InvalidMetadataError(
                "Metadata does not have a title.".to_string(),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn meta(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_validate_metadata_ok() {
        let texts = vec!["a".to_string()];
        let metadatas = vec![meta(&[("title", "A"), ("page", "1")])];
        assert!(validate_documents_metadata(&texts, &metadatas).is_ok());
    }

    #[test]
    fn test_validate_metadata_empty_batch_is_missing() {
        let err = validate_documents_metadata(&[], &[]).unwrap_err();
        assert!(matches!(err, DocuciteError::MissingMetadataError(_)));
    }

    #[test]
    fn test_validate_metadata_empty_map_is_missing() {
        let texts = vec!["a".to_string()];
        let metadatas = vec![HashMap::new()];
        let err = validate_documents_metadata(&texts, &metadatas).unwrap_err();
        assert!(matches!(err, DocuciteError::MissingMetadataError(_)));
    }

    #[test]
    fn test_validate_metadata_titleless_is_invalid() {
        let texts = vec!["a".to_string()];
        let metadatas = vec![meta(&[("page", "1")])];
        let err = validate_documents_metadata(&texts, &metadatas).unwrap_err();
        assert!(matches!(err, DocuciteError::InvalidMetadataError(_)));
    }

    #[test]
    fn test_validate_metadata_empty_title_is_invalid() {
        let texts = vec!["a".to_string()];
        let metadatas = vec![meta(&[("title", "")])];
        let err = validate_documents_metadata(&texts, &metadatas).unwrap_err();
        assert!(matches!(err, DocuciteError::InvalidMetadataError(_)));
    }
}
