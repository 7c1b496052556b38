//! Error types for the hybrid indexing pipeline.

use hybrid_types::HybridError;
use thiserror::Error;

/// Errors that can occur in the indexing pipeline
#[derive(Error, Debug)]
pub enum IndexingError {
    /// Pipeline was built with values it cannot run with
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transient failure reported by the live index engine
    #[error("Index error: {0}")]
    Index(String),

    /// Settings/contract errors from the shared types
    #[error(transparent)]
    Hybrid(#[from] HybridError),
}

impl IndexingError {
    /// Whether retrying the same document later might succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, IndexingError::Index(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IndexingError::Config("queue capacity must be > 0".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: queue capacity must be > 0"
        );

        let err = IndexingError::Index("writer busy".to_string());
        assert_eq!(err.to_string(), "Index error: writer busy");
        assert!(err.is_transient());

        let err = IndexingError::Config("bad".to_string());
        assert!(!err.is_transient());
    }

    #[test]
    fn test_from_hybrid_error() {
        let err: IndexingError = HybridError::Config("bad".to_string()).into();
        assert!(matches!(err, IndexingError::Hybrid(_)));
        assert_eq!(err.to_string(), "Configuration error: bad");
    }
}
