//! Wiring of the NRT path from settings.
//!
//! Builds the shared [`StatsSink`] and [`DocumentQueue`], the commit
//! observer that feeds it and the consumer pool that drains it.

use std::sync::Arc;

use tracing::info;

use hybrid_types::Settings;

use crate::consumer::{ConsumerConfig, ConsumerHandle, IndexingConsumer, ShutdownReport};
use crate::error::IndexingError;
use crate::live_index::LiveIndex;
use crate::observer::CommitObserver;
use crate::queue::DocumentQueue;
use crate::stats::{StatsSink, StatsSnapshot};

/// A running hybrid NRT pipeline.
pub struct HybridPipeline {
    observer: Arc<CommitObserver>,
    queue: Arc<DocumentQueue>,
    stats: Arc<StatsSink>,
    consumer: ConsumerHandle,
}

impl HybridPipeline {
    /// Validate settings and start the consumer pool on the current runtime.
    pub fn start(settings: &Settings, index: Arc<dyn LiveIndex>) -> Result<Self, IndexingError> {
        settings.validate()?;

        let stats = Arc::new(StatsSink::new());
        let queue = Arc::new(DocumentQueue::new(settings.queue_capacity)?);
        let observer = Arc::new(CommitObserver::new(queue.clone(), stats.clone()));

        let consumer = IndexingConsumer::new(
            queue.clone(),
            index,
            stats.clone(),
            ConsumerConfig::from_settings(settings),
        )?
        .start();

        info!(
            queue_capacity = settings.queue_capacity,
            workers = settings.worker_count,
            "Hybrid NRT pipeline started"
        );

        Ok(Self {
            observer,
            queue,
            stats,
            consumer,
        })
    }

    /// Observer to register with the commit dispatcher.
    pub fn observer(&self) -> Arc<CommitObserver> {
        self.observer.clone()
    }

    pub fn queue(&self) -> &Arc<DocumentQueue> {
        &self.queue
    }

    pub fn stats(&self) -> &Arc<StatsSink> {
        &self.stats
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Stop admissions, stop the consumers and report what happened.
    pub async fn shutdown(self) -> ShutdownReport {
        self.consumer.shutdown().await
    }
}
