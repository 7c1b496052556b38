//! Commit metadata and commit-scoped context.
//!
//! The commit pipeline attaches auxiliary values to a [`CommitContext`]
//! while it processes a commit. Values are keyed by their type, so a
//! reader asks for `context.get::<DocumentHolder>()` and receives either
//! the typed holder or `None`. Absence is the normal case for commits
//! that produced nothing to index.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::document::Document;

/// Opaque handle to the repository state a commit produced.
///
/// Observers receive it for completeness; the NRT path does not diff it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryState {
    revision: String,
}

impl RepositoryState {
    pub fn new(revision: impl Into<String>) -> Self {
        Self {
            revision: revision.into(),
        }
    }

    pub fn revision(&self) -> &str {
        &self.revision
    }
}

/// Type-keyed attribute map scoped to a single commit.
#[derive(Default)]
pub struct CommitContext {
    attributes: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl CommitContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a value, replacing any earlier value of the same type.
    pub fn insert<T: Any + Send + Sync>(&mut self, value: T) -> Option<T> {
        self.attributes
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|prev| prev.downcast::<T>().ok())
            .map(|prev| *prev)
    }

    pub fn get<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.attributes
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref::<T>())
    }

    pub fn get_mut<T: Any + Send + Sync>(&mut self) -> Option<&mut T> {
        self.attributes
            .get_mut(&TypeId::of::<T>())
            .and_then(|v| v.downcast_mut::<T>())
    }

    pub fn contains<T: Any + Send + Sync>(&self) -> bool {
        self.attributes.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

impl std::fmt::Debug for CommitContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommitContext")
            .field("attributes", &self.attributes.len())
            .finish()
    }
}

/// Documents produced for the live index while a commit was processed.
#[derive(Debug, Clone, Default)]
pub struct DocumentHolder {
    nrt_documents: Vec<Arc<Document>>,
}

impl DocumentHolder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_documents<I>(docs: I) -> Self
    where
        I: IntoIterator<Item = Document>,
    {
        Self {
            nrt_documents: docs.into_iter().map(Arc::new).collect(),
        }
    }

    /// Append a document. Order of calls is the order documents are offered.
    pub fn push(&mut self, doc: Document) {
        self.nrt_documents.push(Arc::new(doc));
    }

    pub fn nrt_documents(&self) -> &[Arc<Document>] {
        &self.nrt_documents
    }

    pub fn len(&self) -> usize {
        self.nrt_documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nrt_documents.is_empty()
    }
}

/// Metadata describing a completed commit.
#[derive(Debug)]
pub struct CommitInfo {
    pub session_id: String,
    pub user_id: Option<String>,
    pub date: DateTime<Utc>,
    /// Absent for commits made below the tree API.
    context: Option<CommitContext>,
}

impl CommitInfo {
    pub fn new(session_id: impl Into<String>, user_id: Option<String>) -> Self {
        Self {
            session_id: session_id.into(),
            user_id,
            date: Utc::now(),
            context: None,
        }
    }

    pub fn with_context(mut self, context: CommitContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn context(&self) -> Option<&CommitContext> {
        self.context.as_ref()
    }

    /// Documents attached to this commit, if any were produced.
    pub fn document_holder(&self) -> Option<&DocumentHolder> {
        self.context.as_ref().and_then(|c| c.get::<DocumentHolder>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Field;

    #[derive(Debug, PartialEq)]
    struct Marker(u32);

    #[test]
    fn test_context_typed_lookup() {
        let mut ctx = CommitContext::new();
        assert!(ctx.is_empty());
        assert!(ctx.get::<Marker>().is_none());

        assert!(ctx.insert(Marker(1)).is_none());
        assert_eq!(ctx.get::<Marker>(), Some(&Marker(1)));
        assert!(ctx.contains::<Marker>());
        assert!(!ctx.contains::<DocumentHolder>());

        let prev = ctx.insert(Marker(2));
        assert_eq!(prev, Some(Marker(1)));
        assert_eq!(ctx.len(), 1);
    }

    #[test]
    fn test_context_get_mut() {
        let mut ctx = CommitContext::new();
        ctx.insert(DocumentHolder::new());
        ctx.get_mut::<DocumentHolder>()
            .unwrap()
            .push(Document::delete("/x"));

        assert_eq!(ctx.get::<DocumentHolder>().unwrap().len(), 1);
    }

    #[test]
    fn test_commit_info_without_context() {
        let info = CommitInfo::new("session-1", None);
        assert!(info.context().is_none());
        assert!(info.document_holder().is_none());
    }

    #[test]
    fn test_commit_info_context_without_holder() {
        let info = CommitInfo::new("session-1", Some("admin".into()))
            .with_context(CommitContext::new());
        assert!(info.context().is_some());
        assert!(info.document_holder().is_none());
    }

    #[test]
    fn test_holder_preserves_order() {
        let holder = DocumentHolder::with_documents(vec![
            Document::add("/a", vec![Field::text("t", "a")]),
            Document::add("/b", vec![Field::text("t", "b")]),
            Document::delete("/c"),
        ]);

        let ids: Vec<&str> = holder.nrt_documents().iter().map(|d| d.id()).collect();
        assert_eq!(ids, vec!["/a", "/b", "/c"]);
    }

    #[test]
    fn test_repository_state() {
        let state = RepositoryState::new("r1-0-1");
        assert_eq!(state.revision(), "r1-0-1");
    }
}
