//! Live Tantivy index for the hybrid NRT pipeline.
//!
//! Documents applied by the indexing consumer land in an in-memory index
//! that answers queries until the durable index catches up.
//!
//! ## Usage
//!
//! ```ignore
//! use hybrid_search::{LiveIndexConfig, LiveSearchIndex};
//!
//! let index = Arc::new(LiveSearchIndex::create_in_ram(LiveIndexConfig::new("nrt"))?);
//! let pipeline = HybridPipeline::start(&settings, index.clone())?;
//! let hits = index.search("quarterly report", 10)?;
//! ```

pub mod document;
pub mod error;
pub mod index;
pub mod schema;

pub use document::{fields_to_doc, keyword_term, stored_fields};
pub use error::SearchError;
pub use index::{LiveIndexConfig, LiveSearchIndex, SearchHit};
pub use schema::{build_live_schema, LiveSchema};
