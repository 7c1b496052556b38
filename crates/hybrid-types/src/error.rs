//! Error types shared across the hybrid indexing crates.

use thiserror::Error;

/// Configuration and contract errors.
///
/// These surface at startup; nothing on the commit path returns them.
#[derive(Debug, Error)]
pub enum HybridError {
    /// Configuration could not be loaded or failed validation
    #[error("Configuration error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = HybridError::Config("queue_capacity must be > 0".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: queue_capacity must be > 0"
        );
    }
}
