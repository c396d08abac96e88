//! Document normalization
//!
//! Stateless conversion from [`Document`] objects to the (text, metadata)
//! pairs the store's insert primitive expects.

use docucite_core::Document;
use std::collections::HashMap;

/// Stateless document transformation utility
pub struct DocumentService;

impl DocumentService {
    /// Map each document to a `(text, metadata)` pair, preserving input
    /// order. Performs no validation and no side effects.
    pub fn documents_to_texts(documents: &[Document]) -> Vec<(String, HashMap<String, String>)> {
        documents
            .iter()
            .map(|doc| (doc.text.clone(), doc.metadata.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documents_to_texts_preserves_order() {
        let docs = vec![
            Document::new("first").with_title("One"),
            Document::new("second").with_title("Two"),
        ];

        let pairs = DocumentService::documents_to_texts(&docs);

        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].0, "first");
        assert_eq!(pairs[1].0, "second");
        assert_eq!(pairs[0].1.get("title").map(String::as_str), Some("One"));
    }

    #[test]
    fn test_documents_to_texts_no_validation() {
        // Title-less documents pass through untouched; validation is the
        // database service's job.
        let docs = vec![Document::new("no title here")];
        let pairs = DocumentService::documents_to_texts(&docs);
        assert!(pairs[0].1.is_empty());
    }
}
