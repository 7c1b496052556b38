//! Live index trait for near-real-time updates.
//!
//! Defines the interface the consumer writes through. The engine behind
//! it owns its own storage; the consumer only upserts, deletes and asks
//! for a refresh so pending changes become searchable.

use hybrid_types::{Document, DocumentSource, Field};

use crate::error::IndexingError;

/// Trait for the live (NRT) index engine.
///
/// Implementations must be safe to call from several consumer workers.
/// Errors are treated as per-document failures by the consumer.
pub trait LiveIndex: Send + Sync {
    /// Insert or replace the entry keyed by `id`.
    fn upsert(&self, id: &str, fields: &[Field]) -> Result<(), IndexingError>;

    /// Remove the entry keyed by `id`. Removing a missing id is not an error.
    fn delete(&self, id: &str) -> Result<(), IndexingError>;

    /// Make applied changes visible to searchers.
    ///
    /// Called once per applied batch.
    fn refresh(&self) -> Result<(), IndexingError>;

    /// Get the name of this index for logging.
    fn name(&self) -> &str;
}

/// Apply a single document according to its source marker.
pub fn apply_document(index: &dyn LiveIndex, doc: &Document) -> Result<(), IndexingError> {
    match doc.source() {
        DocumentSource::Add | DocumentSource::Update => index.upsert(doc.id(), doc.fields()),
        DocumentSource::Delete => index.delete(doc.id()),
    }
}

/// Outcome of applying a batch of documents.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ApplyResult {
    /// Documents upserted successfully
    pub upserted: usize,
    /// Delete markers applied successfully
    pub deleted: usize,
    /// Documents the engine rejected
    pub failed: usize,
}

impl ApplyResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful apply of a document with the given source.
    pub fn record_success(&mut self, source: DocumentSource) {
        if source.is_upsert() {
            self.upserted += 1;
        } else {
            self.deleted += 1;
        }
    }

    pub fn record_failure(&mut self) {
        self.failed += 1;
    }

    /// Merge another result into this one.
    pub fn merge(&mut self, other: &ApplyResult) {
        self.upserted += other.upserted;
        self.deleted += other.deleted;
        self.failed += other.failed;
    }

    pub fn applied(&self) -> usize {
        self.upserted + self.deleted
    }

    /// Whether anything changed in the index.
    pub fn has_updates(&self) -> bool {
        self.applied() > 0
    }

    pub fn total(&self) -> usize {
        self.applied() + self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingIndex {
        calls: Mutex<Vec<String>>,
    }

    impl LiveIndex for RecordingIndex {
        fn upsert(&self, id: &str, fields: &[Field]) -> Result<(), IndexingError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("upsert:{}:{}", id, fields.len()));
            Ok(())
        }

        fn delete(&self, id: &str) -> Result<(), IndexingError> {
            self.calls.lock().unwrap().push(format!("delete:{}", id));
            Ok(())
        }

        fn refresh(&self) -> Result<(), IndexingError> {
            Ok(())
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    #[test]
    fn test_apply_document_routes_by_source() {
        let index = RecordingIndex::default();

        apply_document(&index, &Document::add("/a", vec![Field::text("t", "a")])).unwrap();
        apply_document(&index, &Document::update("/a", vec![])).unwrap();
        apply_document(&index, &Document::delete("/b")).unwrap();

        let calls = index.calls.lock().unwrap().clone();
        assert_eq!(calls, vec!["upsert:/a:1", "upsert:/a:0", "delete:/b"]);
    }

    #[test]
    fn test_apply_result_record() {
        let mut result = ApplyResult::new();
        result.record_success(DocumentSource::Add);
        result.record_success(DocumentSource::Update);
        result.record_success(DocumentSource::Delete);
        result.record_failure();

        assert_eq!(result.upserted, 2);
        assert_eq!(result.deleted, 1);
        assert_eq!(result.failed, 1);
        assert_eq!(result.applied(), 3);
        assert_eq!(result.total(), 4);
        assert!(result.has_updates());
    }

    #[test]
    fn test_apply_result_merge() {
        let mut a = ApplyResult {
            upserted: 5,
            deleted: 1,
            failed: 2,
        };
        let b = ApplyResult {
            upserted: 1,
            deleted: 0,
            failed: 1,
        };
        a.merge(&b);
        assert_eq!(a.upserted, 6);
        assert_eq!(a.failed, 3);
    }

    #[test]
    fn test_apply_result_failures_only() {
        let mut result = ApplyResult::new();
        result.record_failure();
        assert!(!result.has_updates());
    }
}
