//! # hybrid-types
//!
//! Shared domain types for the hybrid NRT indexing pipeline.
//!
//! This crate defines the data structures passed between the commit path
//! and the background indexer:
//! - Documents: Immutable indexable records keyed by the item they replace
//! - Commit info: Per-commit metadata and the typed commit-scoped context
//! - Settings: Layered configuration for queue, workers and shutdown
//!
//! ## Usage
//!
//! ```rust
//! use hybrid_types::{Document, Field};
//!
//! let doc = Document::add("/content/a", vec![Field::text("title", "hello")]);
//! assert_eq!(doc.id(), "/content/a");
//! ```

pub mod commit;
pub mod config;
pub mod document;
pub mod error;
pub mod logging;

pub use commit::{CommitContext, CommitInfo, DocumentHolder, RepositoryState};
pub use config::{Settings, MAX_QUEUE_CAPACITY};
pub use document::{Document, DocumentSource, Field, FieldOptions, FieldValue};
pub use error::HybridError;
pub use logging::init_tracing;
