//! Search error types.

use hybrid_indexing::IndexingError;
use thiserror::Error;

/// Errors that can occur in the live index.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Tantivy index error
    #[error("Tantivy error: {0}")]
    Tantivy(#[from] tantivy::TantivyError),

    /// Query parse error
    #[error("Query parse error: {0}")]
    QueryParse(#[from] tantivy::query::QueryParserError),

    /// Stored field payload could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Writer lock poisoned by a panicking writer
    #[error("Index is locked: {0}")]
    IndexLocked(String),
}

impl From<SearchError> for IndexingError {
    fn from(err: SearchError) -> Self {
        IndexingError::Index(err.to_string())
    }
}
