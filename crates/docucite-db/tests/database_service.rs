//! Database service integration tests against in-memory fakes.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use docucite_core::{Document, DocuciteError, Result, ScoredText, StoreContents};
use docucite_db::DatabaseService;
use docucite_vector::{StoreOpener, VectorStore};

/// In-memory stand-in for the vector store; no embeddings involved.
#[derive(Default)]
struct FakeStore {
    records: RwLock<Vec<(String, String, HashMap<String, String>)>>,
}

#[async_trait]
impl VectorStore for FakeStore {
    async fn add_texts(
        &self,
        texts: Vec<String>,
        metadatas: Vec<HashMap<String, String>>,
    ) -> Result<Vec<String>> {
        let mut records = self.records.write().unwrap();
        let mut ids = Vec::with_capacity(texts.len());
        for (text, metadata) in texts.into_iter().zip(metadatas) {
            let id = format!("id-{}", records.len());
            records.push((id.clone(), text, metadata));
            ids.push(id);
        }
        Ok(ids)
    }

    async fn get(&self) -> Result<StoreContents> {
        let records = self.records.read().unwrap();
        Ok(StoreContents {
            ids: records.iter().map(|(id, _, _)| id.clone()).collect(),
            metadatas: records.iter().map(|(_, _, m)| m.clone()).collect(),
        })
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.records.read().unwrap().len())
    }

    async fn similarity_search(&self, _query: &str, top_k: usize) -> Result<Vec<ScoredText>> {
        let records = self.records.read().unwrap();
        Ok(records
            .iter()
            .take(top_k)
            .map(|(id, text, metadata)| ScoredText {
                id: id.clone(),
                text: text.clone(),
                metadata: metadata.clone(),
                score: 1.0,
            })
            .collect())
    }
}

/// Opener that creates the database directory (as a real store would when
/// persisting) and hands out fresh fake stores.
struct FakeOpener;

#[async_trait]
impl StoreOpener for FakeOpener {
    async fn open(&self, path: Option<&Path>) -> Result<Arc<dyn VectorStore>> {
        if let Some(dir) = path {
            std::fs::create_dir_all(dir).map_err(|e| {
                DocuciteError::DatabaseError(format!("create dir failed: {e}"))
            })?;
        }
        Ok(Arc::new(FakeStore::default()))
    }
}

fn doc(text: &str, title: &str) -> Document {
    Document::new(text).with_title(title)
}

async fn in_memory_service() -> (tempfile::TempDir, DatabaseService) {
    let base = tempfile::tempdir().unwrap();
    let mut service = DatabaseService::new(base.path(), None, Arc::new(FakeOpener));
    service.create_database().await.unwrap();
    (base, service)
}

#[tokio::test]
async fn add_documents_increases_count_and_titles_are_retrievable() {
    let (_base, service) = in_memory_service().await;
    let store = service.store().unwrap();
    assert_eq!(store.count().await.unwrap(), 0);

    let docs = vec![
        doc("first text", "Alpha"),
        doc("second text", "Beta"),
        doc("third text", "Gamma"),
    ];
    service.add_documents(&docs).await.unwrap();

    assert_eq!(store.count().await.unwrap(), 3);
    let titles = store.get().await.unwrap().lowercase_titles();
    assert_eq!(titles, vec!["alpha", "beta", "gamma"]);
}

#[tokio::test]
async fn create_database_twice_fails_and_keeps_data() {
    let base = tempfile::tempdir().unwrap();

    let mut first = DatabaseService::new(base.path(), Some("books"), Arc::new(FakeOpener));
    first.create_database().await.unwrap();
    assert!(first.is_bound());
    assert!(base.path().join("books").is_dir());

    let mut second = DatabaseService::new(base.path(), Some("books"), Arc::new(FakeOpener));
    let err = second.create_database().await.unwrap_err();
    assert!(matches!(err, DocuciteError::DatabaseError(_)));
    assert!(!second.is_bound());
    assert!(base.path().join("books").is_dir());
}

#[tokio::test]
async fn create_database_makes_base_dir() {
    let base = tempfile::tempdir().unwrap();
    let nested = base.path().join("data").join("database");

    let mut service = DatabaseService::new(&nested, Some("books"), Arc::new(FakeOpener));
    service.create_database().await.unwrap();

    assert!(nested.join("books").is_dir());
}

#[tokio::test]
async fn create_in_memory_database_also_makes_base_dir() {
    let base = tempfile::tempdir().unwrap();
    let nested = base.path().join("data").join("database");

    let mut service = DatabaseService::new(&nested, None, Arc::new(FakeOpener));
    service.create_database().await.unwrap();

    assert!(service.is_bound());
    assert!(nested.is_dir());
}

#[tokio::test]
async fn load_database_on_missing_path_fails_and_stays_unbound() {
    let base = tempfile::tempdir().unwrap();

    let mut service = DatabaseService::new(base.path(), Some("nope"), Arc::new(FakeOpener));
    let err = service.load_database().await.unwrap_err();

    assert!(matches!(err, DocuciteError::DatabaseError(_)));
    assert!(!service.is_bound());
}

#[tokio::test]
async fn load_database_binds_existing_path() {
    let base = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(base.path().join("books")).unwrap();

    let mut service = DatabaseService::new(base.path(), Some("books"), Arc::new(FakeOpener));
    service.load_database().await.unwrap();
    assert!(service.is_bound());
}

#[tokio::test]
async fn add_documents_on_unbound_service_fails() {
    let service = DatabaseService::new("unused", Some("books"), Arc::new(FakeOpener));
    let err = service
        .add_documents(&[doc("text", "Title")])
        .await
        .unwrap_err();
    assert!(matches!(err, DocuciteError::DatabaseError(_)));
}

#[tokio::test]
async fn title_uniqueness_is_case_insensitive() {
    let (_base, service) = in_memory_service().await;
    service.add_documents(&[doc("body", "report")]).await.unwrap();

    let err = service
        .add_documents(&[doc("other body", "Report")])
        .await
        .unwrap_err();
    match err {
        DocuciteError::DatabaseError(msg) => assert!(msg.contains("report")),
        other => panic!("expected DatabaseError, got {other:?}"),
    }

    // Nothing from the failed batch was inserted
    let store = service.store().unwrap();
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn batch_with_duplicate_fails_atomically() {
    let (_base, service) = in_memory_service().await;
    service.add_documents(&[doc("body", "Existing")]).await.unwrap();

    let batch = vec![
        doc("a", "Fresh One"),
        doc("b", "existing"),
        doc("c", "Fresh Two"),
    ];
    assert!(service.add_documents(&batch).await.is_err());

    let store = service.store().unwrap();
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn batch_with_invalid_metadata_fails_atomically() {
    let (_base, service) = in_memory_service().await;

    let batch = vec![
        doc("a", "One"),
        Document::new("b").with_metadata("page", "2"), // no title
        doc("c", "Three"),
    ];
    let err = service.add_documents(&batch).await.unwrap_err();
    assert!(matches!(err, DocuciteError::InvalidMetadataError(_)));

    let store = service.store().unwrap();
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn empty_metadata_is_reported_as_missing() {
    let (_base, service) = in_memory_service().await;

    let err = service
        .add_documents(&[Document::new("bare")])
        .await
        .unwrap_err();
    assert!(matches!(err, DocuciteError::MissingMetadataError(_)));

    let err = service.add_documents(&[]).await.unwrap_err();
    assert!(matches!(err, DocuciteError::MissingMetadataError(_)));
}

#[tokio::test]
async fn added_documents_round_trip_through_get() {
    let (_base, service) = in_memory_service().await;
    let docs = vec![
        doc("alpha text", "Alpha").with_metadata("page", "1"),
        doc("beta text", "Beta").with_metadata("page", "2"),
    ];
    service.add_documents(&docs).await.unwrap();

    let contents = service.store().unwrap().get().await.unwrap();
    assert_eq!(contents.len(), 2);
    for (document, metadata) in docs.iter().zip(&contents.metadatas) {
        assert_eq!(metadata.get("title"), document.metadata.get("title"));
        assert_eq!(metadata.get("page"), document.metadata.get("page"));
    }
}
