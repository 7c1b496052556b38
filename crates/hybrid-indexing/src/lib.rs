//! Near-real-time indexing path for the hybrid index.
//!
//! This crate moves documents produced during a commit into a live
//! index without ever making the commit wait on indexing.
//!
//! ## Key Components
//!
//! - [`StatsSink`]: Monotonic `admitted`, `dropped` and `apply-failed` counters
//! - [`DocumentQueue`]: Bounded FIFO that rejects when full
//! - [`CommitObserver`]: Offers each commit's documents to the queue
//! - [`IndexingConsumer`]: Worker pool applying queued documents to a [`LiveIndex`]
//! - [`HybridPipeline`]: Builds and runs all of the above from [`hybrid_types::Settings`]
//!
//! ## Architecture
//!
//! 1. A commit completes and the commit pipeline calls the observer
//! 2. The observer offers every attached document; overflow is dropped and counted
//! 3. Consumer workers take batches in admission order
//! 4. Each document is upserted or deleted in the live index, then the index refreshes
//! 5. The durable index catches up separately and remains the system of record
//!
//! ## Example
//!
//! ```ignore
//! use hybrid_indexing::HybridPipeline;
//!
//! let pipeline = HybridPipeline::start(&settings, live_index)?;
//! dispatcher.add(pipeline.observer());
//!
//! // ... commits happen ...
//!
//! let report = pipeline.shutdown().await;
//! ```

pub mod consumer;
pub mod error;
pub mod live_index;
pub mod observer;
pub mod pipeline;
pub mod queue;
pub mod stats;

pub use consumer::{ConsumerConfig, ConsumerHandle, IndexingConsumer, ShutdownReport};
pub use error::IndexingError;
pub use live_index::{apply_document, ApplyResult, LiveIndex};
pub use observer::{CommitObserver, CommitOutcome, CompositeObserver, Observer};
pub use pipeline::HybridPipeline;
pub use queue::{DocumentQueue, OfferRejected};
pub use stats::{Counter, StatsSink, StatsSnapshot};
